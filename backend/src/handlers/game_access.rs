use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{
        header::{CACHE_CONTROL, EXPIRES, PRAGMA},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppError, services::game_access::DenialReason, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct GameAccessQuery {
    /// Shareable game code; case-insensitive.
    pub code: Option<String>,
    /// Restrict the check to one mode.
    pub game_mode: Option<String>,
}

/// Anonymous play-access check, re-evaluated on every call. The router wraps
/// it in [`with_no_store`].
pub async fn check_game_access(
    State(state): State<AppState>,
    query: Result<Query<GameAccessQuery>, QueryRejection>,
) -> Response {
    match query {
        Err(rejection) => AppError::BadRequest(rejection.body_text()).into_response(),
        Ok(Query(query)) => match query.code.as_deref().map(str::trim) {
            None | Some("") => {
                AppError::BadRequest("Game code is required".into()).into_response()
            }
            Some(code) => {
                let result = state
                    .game_access
                    .validate(code, query.game_mode.as_deref())
                    .await;
                let status = match result.error {
                    None => StatusCode::OK,
                    Some(DenialReason::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
                    Some(_) => StatusCode::FORBIDDEN,
                };
                (status, Json(result)).into_response()
            }
        },
    }
}

/// Forbids caching by browsers and intermediaries.
pub fn with_no_store(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    response
}
