use anyhow::anyhow;
use axum::{
    extract::{Extension, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    error::AppError,
    handlers::audit_context,
    middleware::{request_id::RequestId, tab_session::tab_session_from_headers},
    models::audit_log::AuditAction,
    services::tab_session::TabSessionError,
    state::AppState,
    utils::cookies::{
        build_clear_cookie, ACCESS_COOKIE_NAME, ACCESS_COOKIE_PATH, CSRF_COOKIE_NAME,
        CSRF_COOKIE_PATH,
    },
};

/// Ends the browser's session: invalidates the tab session named in
/// `x-tab-session`, signs out of the identity provider and clears cookies.
/// The local sign-out always completes, whatever fails along the way.
pub async fn logout(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
) -> Response {
    let user = match state.identity.current_user(&headers).await {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(error = %err, "Logout without a verifiable identity");
            None
        }
    };
    let ctx = audit_context(&headers, request_id, user.as_ref().map(|user| user.id));

    let mut tab_session_invalidated = false;
    if let Some(tab_session) = tab_session_from_headers(&headers) {
        match state.tab_sessions.invalidate(&tab_session, &ctx).await {
            Ok(()) => tab_session_invalidated = true,
            Err(TabSessionError::NotFound) => {}
            Err(err) => {
                tracing::warn!(error = %err, "Failed to invalidate tab session during logout");
            }
        }
    }

    let sign_out = state.identity.sign_out(&headers).await;

    if let Some(user) = &user {
        tracing::info!(user_id = %user.id, "User logged out");
        state.audit.record_detached(ctx.entry(
            AuditAction::Logout,
            json!({
                "tabSessionInvalidated": tab_session_invalidated,
                "identitySignOut": sign_out.is_ok(),
            }),
        ));
    }

    let mut response = match sign_out {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(err) => {
            AppError::InternalServerError(anyhow!("identity provider sign-out failed: {}", err))
                .into_response()
        }
    };

    let options = state.config.cookie_options();
    for cookie in [
        build_clear_cookie(ACCESS_COOKIE_NAME, ACCESS_COOKIE_PATH, options),
        build_clear_cookie(CSRF_COOKIE_NAME, CSRF_COOKIE_PATH, options),
    ] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}
