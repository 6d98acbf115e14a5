use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_LENGTH, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::middleware::request_id::RequestId;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 2048;

macro_rules! log_by_status {
    ($status:expr, $($field:tt)+) => {
        if $status >= 500 {
            tracing::error!($($field)+)
        } else {
            tracing::warn!($($field)+)
        }
    };
}

/// Logs every 4xx/5xx response with a preview of its body, then forwards the
/// buffered body unchanged. Only the path is logged: query strings carry game
/// codes.
pub async fn log_error_responses(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = status.as_u16();
    let (mut parts, body) = response.into_parts();
    match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => {
            log_by_status!(
                status,
                status,
                method = %method,
                path = %path,
                request_id = %request_id,
                latency_ms,
                body = %body_preview(&bytes),
                "Request completed with error status"
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            log_by_status!(
                status,
                status,
                method = %method,
                path = %path,
                request_id = %request_id,
                latency_ms,
                error = ?err,
                "Failed to read error response body"
            );
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::empty())
        }
    }
}

fn body_preview(bytes: &Bytes) -> String {
    if bytes.len() > MAX_LOGGED_BODY_BYTES {
        format!(
            "{}... (truncated, {} bytes total)",
            String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
            bytes.len()
        )
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
