use axum::{
    extract::State,
    http::{
        header::{CACHE_CONTROL, SET_COOKIE},
        HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

use crate::{
    state::AppState,
    utils::{
        cookies::{build_cookie, CSRF_COOKIE_NAME, CSRF_COOKIE_PATH},
        csrf::generate_token,
    },
};

const CSRF_COOKIE_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Issues a fresh double-submit token: returned in the body for the
/// `x-csrf-token` header and mirrored into the `csrf_token` cookie.
pub async fn issue_csrf_token(State(state): State<AppState>) -> Response {
    let token = generate_token();
    let cookie = build_cookie(
        CSRF_COOKIE_NAME,
        &token,
        CSRF_COOKIE_MAX_AGE,
        CSRF_COOKIE_PATH,
        state.config.cookie_options(),
    );

    let mut response = Json(CsrfTokenResponse { csrf_token: token }).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
