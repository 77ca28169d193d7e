//! Request handlers

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        ConnectInfo, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use postrelay_core::EmailRequest;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::diagnostics::{client_ip, local_hostname, resolve_host, IpInfo};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /:endpoint`: every send endpoint goes through here
///
/// Extractor rejections are answered here too, so an unreadable or
/// oversized body is still a JSON 400 and still counted.
pub async fn send_email(
    State(state): State<AppState>,
    endpoint: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let endpoint = match endpoint {
        Ok(Path(endpoint)) => endpoint,
        Err(rejection) => {
            warn!("Rejected send path: {}", rejection.body_text());
            return ApiError::BadRequest(rejection.body_text()).into_response();
        }
    };
    let Some(route) = state.routes.resolve(&endpoint) else {
        return ApiError::NotFound(endpoint).into_response();
    };

    let result: ApiResult<()> = match body {
        Ok(body) => match serde_json::from_slice::<EmailRequest>(&body) {
            Ok(request) => state
                .relay
                .send(&route.sender, route.format, &request)
                .await
                .map_err(ApiError::from),
            Err(e) => Err(ApiError::BadRequest(e.to_string())),
        },
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    };

    let response = match result {
        Ok(()) => {
            info!("Email relayed via /{}", endpoint);
            let message = format!("Email sent successfully from {}", route.sender);
            (StatusCode::OK, Json(json!({ "message": message }))).into_response()
        }
        Err(e) => {
            warn!("/{} failed: {}", endpoint, e);
            e.into_response()
        }
    };

    state.metrics.record(&route.sender, response.status().as_u16());
    response
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// `GET /get-ip`
pub async fn get_ip(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<IpInfo> {
    let hostname = local_hostname();
    let ips = resolve_host(&hostname).await;
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let client_ip = client_ip(peer, &headers, &state.trusted_proxies).map(|ip| ip.to_string());

    Json(IpInfo {
        hostname,
        ips,
        client_ip,
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    )
        .into_response())
}

/// Anything without a route
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(uri.path().trim_start_matches('/').to_string())
}
