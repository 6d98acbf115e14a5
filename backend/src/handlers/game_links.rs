use axum::{
    extract::{Extension, Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::audit_context,
    middleware::request_id::RequestId,
    models::{
        audit_log::AuditAction,
        game_link::{GameLinkStatusResponse, SetGameLinkActive},
    },
    services::{game_access::DenialReason, identity::AuthenticatedUser},
    state::AppState,
    types::GameLinkId,
};

/// Owner kill switch. Takes effect on the very next access check.
pub async fn set_game_link_active(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
    Path(link_id): Path<String>,
    Json(payload): Json<SetGameLinkActive>,
) -> Result<Json<GameLinkStatusResponse>, AppError> {
    payload.validate()?;
    let link_id: GameLinkId = link_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid game link id".into()))?;
    let ctx = audit_context(&headers, request_id, Some(user.id));

    let link = match state.game_access.authorize_owner(link_id, user.id).await {
        Ok(link) => link,
        Err(DenialReason::OwnerMismatch) => {
            tracing::warn!(
                user_id = %user.id,
                game_link_id = %link_id,
                "Rejected game link update by non-owner"
            );
            state.audit.record_detached(ctx.entry(
                AuditAction::UnauthorizedAccessAttempt,
                json!({
                    "resource": "game_link",
                    "gameLinkId": link_id.to_string(),
                    "attemptedAction": "set_active",
                }),
            ));
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        Err(DenialReason::NotFound) => {
            return Err(AppError::NotFound("Game link not found".into()))
        }
        Err(DenialReason::Unavailable) => {
            return Err(AppError::ServiceUnavailable(
                "Storage temporarily unavailable".into(),
            ))
        }
        Err(reason) => return Err(AppError::Forbidden(reason.as_str().into())),
    };

    let updated = state
        .game_links
        .set_active(link_id, user.id, payload.is_active, state.clock.now())
        .await?
        .ok_or_else(|| AppError::NotFound("Game link not found".into()))?;

    tracing::info!(
        user_id = %user.id,
        game_link_id = %link_id,
        is_active = updated.is_active,
        "Game link activity changed"
    );
    state.audit.record_detached(ctx.entry(
        AuditAction::GameLinkUpdated,
        json!({
            "gameLinkId": link_id.to_string(),
            "field": "isActive",
            "previous": link.is_active,
            "current": updated.is_active,
            "reason": payload.reason,
        }),
    ));

    Ok(Json(GameLinkStatusResponse::from(&updated)))
}
