use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::identity::AuthenticatedUser, state::AppState};

pub const TAB_SESSION_HEADER: &str = "x-tab-session";

pub fn tab_session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TAB_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Admits the request only with a live tab session owned by the caller that
/// [`require_user`](super::auth::require_user) resolved. The activity bump
/// after the check is best effort: a failed touch never blocks the request.
pub async fn require_tab_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.id)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;
    let id = tab_session_from_headers(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Tab session required".to_string()))?;

    if !state.tab_sessions.is_active_for(&id, user_id).await? {
        tracing::debug!(user_id = %user_id, "Rejected inactive or foreign tab session");
        return Err(AppError::Unauthorized(
            "Tab session is not active".to_string(),
        ));
    }

    if let Err(err) = state.tab_sessions.touch(&id).await {
        tracing::warn!(error = %err, "Failed to record tab session activity");
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn blank_header_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(TAB_SESSION_HEADER, HeaderValue::from_static("   "));
        assert!(tab_session_from_headers(&headers).is_none());

        headers.insert(TAB_SESSION_HEADER, HeaderValue::from_static(" abc "));
        assert_eq!(tab_session_from_headers(&headers).as_deref(), Some("abc"));
    }
}
