pub mod auth;
pub mod csrf;
pub mod game_access;
pub mod game_links;
pub mod tab_sessions;

use axum::{http::HeaderMap, Extension};

use crate::{
    middleware::request_id::RequestId, services::audit_log::AuditContext, types::UserId,
    utils::RequestMeta,
};

/// Audit context for the current request.
pub(crate) fn audit_context(
    headers: &HeaderMap,
    request_id: Option<Extension<RequestId>>,
    user_id: Option<UserId>,
) -> AuditContext {
    AuditContext::new(
        user_id,
        RequestMeta::from_headers(headers),
        request_id.map(|Extension(RequestId(id))| id),
    )
}
