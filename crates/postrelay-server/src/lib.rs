//! HTTP front end for postrelay
//!
//! A single generic send handler consults the route table; health,
//! diagnostics and metrics endpoints sit next to it.

pub mod diagnostics;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use metrics::RelayMetrics;
pub use state::{AppState, RouteTable, SendRoute};

/// Build the application router
pub fn app(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/health", get(handlers::health))
        .route("/get-ip", get(handlers::get_ip))
        .route("/metrics", get(handlers::metrics))
        .route("/:endpoint", post(handlers::send_email))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
