#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::{csrf::CsrfTokenResponse, game_access::GameAccessQuery},
    models::{
        game_link::{GameLinkStatusResponse, GameLinkView, SetGameLinkActive},
        tab_session::{TabSessionCreated, TabSessionStatus},
    },
    services::game_access::{AccessResult, DenialReason},
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        create_tab_session_doc,
        refresh_tab_session_doc,
        logout_doc,
        csrf_token_doc,
        game_access_doc,
        set_game_link_active_doc
    ),
    components(
        schemas(
            // tab sessions
            TabSessionCreated,
            TabSessionStatus,
            // game access
            AccessResult,
            DenialReason,
            GameLinkView,
            SetGameLinkActive,
            GameLinkStatusResponse,
            // csrf
            CsrfTokenResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Sessions", description = "Per-tab sessions and logout"),
        (name = "GameAccess", description = "Anonymous play access by game code"),
        (name = "GameLinks", description = "Owner management of game links"),
        (name = "Security", description = "CSRF token issuance")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());
        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));

        components.add_security_scheme(
            "TabSession",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-tab-session"))),
        );
        components.add_security_scheme(
            "CsrfToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-csrf-token"))),
        );
    }
}

#[utoipa::path(
    post,
    path = "/api/tab-sessions",
    responses(
        (status = 201, description = "Tab session created", body = TabSessionCreated),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "CSRF check failed")
    ),
    tag = "Sessions",
    security(("BearerAuth" = [], "CsrfToken" = []))
)]
fn create_tab_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/tab-sessions/refresh",
    responses(
        (status = 200, description = "Tab session extended", body = serde_json::Value),
        (status = 401, description = "Missing, expired, invalidated or unknown tab session"),
        (status = 503, description = "Session store unavailable")
    ),
    tag = "Sessions",
    security(("TabSession" = []))
)]
fn refresh_tab_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out; cookies cleared", body = serde_json::Value),
        (status = 500, description = "Identity provider sign-out failed; cookies still cleared")
    ),
    tag = "Sessions",
    security((), ("BearerAuth" = []))
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/csrf-token",
    responses((status = 200, description = "Token issued and mirrored into the csrf_token cookie", body = CsrfTokenResponse)),
    tag = "Security",
    security(())
)]
fn csrf_token_doc() {}

#[utoipa::path(
    get,
    path = "/api/game-access",
    params(GameAccessQuery),
    responses(
        (status = 200, description = "Access granted", body = AccessResult),
        (status = 400, description = "Missing game code"),
        (status = 403, description = "Access denied", body = AccessResult),
        (status = 429, description = "Rate limited"),
        (status = 503, description = "Game link store unavailable", body = AccessResult)
    ),
    tag = "GameAccess",
    security(())
)]
fn game_access_doc() {}

#[utoipa::path(
    put,
    path = "/api/game-links/{id}/active",
    params(("id" = String, Path, description = "Game link id")),
    request_body = SetGameLinkActive,
    responses(
        (status = 200, description = "Kill switch updated", body = GameLinkStatusResponse),
        (status = 401, description = "Not authenticated or no active tab session"),
        (status = 403, description = "Not the owner, or CSRF check failed"),
        (status = 404, description = "Game link not found")
    ),
    tag = "GameLinks",
    security(("BearerAuth" = [], "CsrfToken" = [], "TabSession" = []))
)]
fn set_game_link_active_doc() {}
