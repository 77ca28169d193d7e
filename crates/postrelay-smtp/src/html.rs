//! HTML message rendering through lettre's message builder

use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::message::{generate_message_id, parse_address};
use crate::{OutgoingMessage, RawMessage, SmtpError, SmtpResult};

/// Build a lettre Message with a single `text/html` body
///
/// With an attachment the message becomes multipart/mixed: the HTML part
/// followed by the file.
pub fn build_html_message(msg: &OutgoingMessage, host: &str) -> SmtpResult<Message> {
    let from = Mailbox::new(None, parse_address(&msg.from)?);
    let to = Mailbox::new(None, parse_address(&msg.to)?);

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(msg.subject.clone())
        .message_id(Some(generate_message_id(host)))
        .user_agent(msg.mailer.clone())
        .envelope(msg.envelope()?);

    let message = match &msg.attachment {
        None => builder
            .header(ContentType::TEXT_HTML)
            .body(msg.body.clone())
            .map_err(|e| SmtpError::MessageBuildError(e.to_string()))?,
        Some(att) => {
            let content_type = ContentType::parse(&att.mime_type)
                .map_err(|e| SmtpError::MessageBuildError(format!("{}: {}", att.mime_type, e)))?;
            let mixed = MultiPart::mixed()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(msg.body.clone()),
                )
                .singlepart(
                    Attachment::new(att.filename.clone()).body(att.data.clone(), content_type),
                );

            builder
                .multipart(mixed)
                .map_err(|e| SmtpError::MessageBuildError(e.to_string()))?
        }
    };

    Ok(message)
}

/// Render the HTML variant to wire bytes
pub fn build_html(msg: &OutgoingMessage, host: &str) -> SmtpResult<RawMessage> {
    let message = build_html_message(msg, host)?;
    let message_id = message
        .headers()
        .get_raw("Message-ID")
        .map(str::to_string)
        .unwrap_or_default();
    Ok(RawMessage::new(
        message.envelope().clone(),
        message_id,
        message.formatted(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutgoingAttachment;

    fn message() -> OutgoingMessage {
        OutgoingMessage::new("service@corp.com", "vendas@corp.com")
            .to("a@b.com")
            .subject("Hi")
            .body("<p>Hello</p>")
    }

    #[test]
    fn test_html_only_message() {
        let raw = build_html(&message(), "smtp.gmail.com").unwrap();
        let text = String::from_utf8_lossy(raw.as_bytes()).to_string();
        assert!(text.contains("Content-Type: text/html; charset=utf-8"));
        assert!(text.contains("<p>Hello</p>"));
        assert!(!text.contains("multipart/mixed"));
        assert!(raw.message_id().ends_with("@smtp.gmail.com>"));
    }

    #[test]
    fn test_to_header_lists_only_recipient() {
        let raw = build_html(&message(), "smtp.gmail.com").unwrap();
        let text = String::from_utf8_lossy(raw.as_bytes()).to_string();
        assert!(text.contains("To: a@b.com\r\n"));
        assert!(text.contains("From: vendas@corp.com\r\n"));
        let rcpt: Vec<String> = raw.envelope().to().iter().map(|a| a.to_string()).collect();
        assert_eq!(rcpt, vec!["a@b.com".to_string()]);
        assert_eq!(
            raw.envelope().from().map(|a| a.to_string()),
            Some("service@corp.com".to_string())
        );
    }

    #[test]
    fn test_html_with_attachment_is_mixed() {
        let msg = message().attachment(Some(OutgoingAttachment::new("a.pdf", b"%PDF".to_vec())));
        let raw = build_html(&msg, "smtp.gmail.com").unwrap();
        let text = String::from_utf8_lossy(raw.as_bytes()).to_string();
        assert!(text.contains("multipart/mixed"));
        assert!(text.contains("Content-Type: application/pdf"));
        assert!(text.contains("filename=\"a.pdf\""));
    }

    #[test]
    fn test_invalid_from_address() {
        let msg = OutgoingMessage::new("service@corp.com", "nobody").to("a@b.com");
        assert!(matches!(
            build_html_message(&msg, "smtp.gmail.com"),
            Err(SmtpError::InvalidAddress(_))
        ));
    }
}
