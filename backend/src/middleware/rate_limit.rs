//! Per-IP throttling for the anonymous game-access endpoint.

use anyhow::anyhow;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};
use governor::middleware::StateInformationMiddleware;
use std::{sync::Arc, time::Duration};
use tower::util::Either;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
    GovernorError, GovernorLayer,
};

use crate::config::Config;

/// Keyed on forwarding headers (`Left`) when the deployment sits behind a
/// trusted proxy, otherwise on the peer address (`Right`).
pub type GameAccessRateLimiter = Either<
    GovernorLayer<SmartIpKeyExtractor, StateInformationMiddleware, Body>,
    GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware, Body>,
>;

/// `RATE_LIMIT_IP_MAX_REQUESTS` is the burst; one slot replenishes every
/// `RATE_LIMIT_IP_WINDOW_SECONDS / burst`. Forwarding headers are only
/// honored with `TRUST_PROXY_HEADERS`, since any client can set them.
pub fn create_game_access_rate_limiter(config: &Config) -> anyhow::Result<GameAccessRateLimiter> {
    let burst_size = config.rate_limit_ip_max_requests.max(1);
    let window = Duration::from_secs(config.rate_limit_ip_window_seconds.max(1));
    let replenish = (window / burst_size).max(Duration::from_millis(1));

    if config.trust_proxy_headers {
        let governor_conf = GovernorConfigBuilder::default()
            .period(replenish)
            .burst_size(burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .ok_or_else(|| anyhow!("invalid game access rate limit configuration"))?;
        return Ok(Either::Left(
            GovernorLayer::new(Arc::new(governor_conf)).error_handler(rate_limit_error_handler),
        ));
    }

    let governor_conf = GovernorConfigBuilder::default()
        .period(replenish)
        .burst_size(burst_size)
        .key_extractor(PeerIpKeyExtractor)
        .use_headers()
        .finish()
        .ok_or_else(|| anyhow!("invalid game access rate limit configuration"))?;
    Ok(Either::Right(
        GovernorLayer::new(Arc::new(governor_conf)).error_handler(rate_limit_error_handler),
    ))
}

fn rate_limit_error_handler(error: GovernorError) -> Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::warn!(wait_time, "Game access rate limit exceeded");
            let mut response = json_error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                "Too many requests. Please try again later.",
                Some(wait_time),
            );
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => {
            tracing::error!("Unable to determine client address for rate limiting");
            json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "rate_limit_key_error",
                "Unable to determine request identity.",
                None,
            )
        }
        GovernorError::Other { code, msg, headers } => {
            let mut response = json_error_response(
                code,
                "rate_limit_error",
                &msg.unwrap_or_else(|| "Rate limit error".to_string()),
                None,
            );
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
    }
}

fn json_error_response(
    status: StatusCode,
    code: &str,
    message: &str,
    retry_after: Option<u64>,
) -> Response<Body> {
    let mut body = serde_json::json!({
        "error": message,
        "code": code,
    });
    if let Some(retry_after) = retry_after {
        body["details"] = serde_json::json!({ "retryAfter": retry_after });
    }

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(retry_after) = retry_after {
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert("retry-after", value);
        }
    }
    response
}
