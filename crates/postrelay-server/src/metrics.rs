//! Outcome counters

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Per-sender outcome counter in a private registry
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    emails_processed: IntCounterVec,
}

impl RelayMetrics {
    /// Create and register the counters
    ///
    /// # Errors
    ///
    /// Returns an error if metrics registration fails.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let emails_processed = IntCounterVec::new(
            Opts::new(
                "email_service_emails_processed_total",
                "Total number of emails processed",
            ),
            &["sender", "code"],
        )?;
        registry.register(Box::new(emails_processed.clone()))?;

        Ok(Self {
            registry,
            emails_processed,
        })
    }

    /// Count one request outcome
    pub fn record(&self, sender: &str, status: u16) {
        let code = status.to_string();
        self.emails_processed
            .with_label_values(&[sender, code.as_str()])
            .inc();
    }

    /// Current value for a sender/status pair
    pub fn processed(&self, sender: &str, status: u16) -> u64 {
        let code = status.to_string();
        self.emails_processed
            .with_label_values(&[sender, code.as_str()])
            .get()
    }

    /// Prometheus text exposition
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_render() {
        let metrics = RelayMetrics::new().unwrap();
        metrics.record("compras", 200);
        metrics.record("compras", 200);
        metrics.record("vendas", 500);

        assert_eq!(metrics.processed("compras", 200), 2);
        assert_eq!(metrics.processed("vendas", 500), 1);
        assert_eq!(metrics.processed("vendas", 200), 0);

        let text = metrics.render().unwrap();
        assert!(text.contains("# TYPE email_service_emails_processed_total counter"));
        assert!(text
            .contains("email_service_emails_processed_total{code=\"200\",sender=\"compras\"} 2"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = RelayMetrics::new().unwrap();
        let b = RelayMetrics::new().unwrap();
        a.record("compras", 200);
        assert_eq!(b.processed("compras", 200), 0);
    }
}
