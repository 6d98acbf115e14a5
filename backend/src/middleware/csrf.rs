use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    utils::{
        cookies::{cookie_from_headers, CSRF_COOKIE_NAME},
        csrf::{extract_token, validate_token},
    },
};

/// Double-submit check: the `x-csrf-token` header must equal the
/// `csrf_token` cookie on every state-changing request.
pub async fn csrf_protect(request: Request, next: Next) -> Result<Response, AppError> {
    if !is_state_changing(request.method()) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();
    let verified = match (
        extract_token(headers),
        cookie_from_headers(headers, CSRF_COOKIE_NAME),
    ) {
        (Some(token), Some(expected)) => validate_token(&token, &expected),
        _ => false,
    };

    if !verified {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            status = StatusCode::FORBIDDEN.as_u16(),
            "CSRF validation failed"
        );
        return Err(AppError::Forbidden("Invalid CSRF token".to_string()));
    }

    Ok(next.run(request).await)
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
