use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::tab_session::tab_session_from_headers,
    models::tab_session::TabSessionCreated,
    services::identity::AuthenticatedUser,
    state::AppState,
};

pub async fn create_tab_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<(StatusCode, Json<TabSessionCreated>), AppError> {
    let session = state.tab_sessions.create(user.id).await?;
    Ok((StatusCode::CREATED, Json(TabSessionCreated::from(&session))))
}

/// Keeps a tab session alive. The token itself is the credential, so no
/// identity-provider session is required.
pub async fn refresh_tab_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let id = tab_session_from_headers(&headers)
        .ok_or_else(|| AppError::Unauthorized("Tab session required".into()))?;
    state.tab_sessions.refresh(&id).await?;
    Ok(Json(json!({ "success": true })))
}
