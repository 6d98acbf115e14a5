pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    docs::ApiDoc,
    handlers::game_access::with_no_store,
    middleware::{
        create_game_access_rate_limiter, csrf_protect, log_error_responses, request_id,
        require_tab_session, require_user,
    },
    state::AppState,
};

/// Assembles every route with its guards and the shared layers.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Token-bearing or side-effect-free routes: no identity required.
    let public_routes = Router::new()
        .route(
            "/api/tab-sessions/refresh",
            post(handlers::tab_sessions::refresh_tab_session),
        )
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/csrf-token", get(handlers::csrf::issue_csrf_token));

    // Anonymous players; throttled per client IP and never cacheable.
    let game_access_routes = Router::new()
        .route(
            "/api/game-access",
            get(handlers::game_access::check_game_access),
        )
        .route_layer(create_game_access_rate_limiter(&state.config)?)
        .route_layer(axum_middleware::map_response(no_store));

    // Layers run bottom-up: identity, then CSRF.
    let user_routes = Router::new()
        .route(
            "/api/tab-sessions",
            post(handlers::tab_sessions::create_tab_session),
        )
        .route_layer(axum_middleware::from_fn(csrf_protect))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    // Identity, then CSRF, then a live tab session.
    let management_routes = Router::new()
        .route(
            "/api/game-links/{id}/active",
            put(handlers::game_links::set_game_link_active),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_tab_session,
        ))
        .route_layer(axum_middleware::from_fn(csrf_protect))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    let cors = cors_layer(&state.config);

    Ok(Router::new()
        .merge(public_routes)
        .merge(game_access_routes)
        .merge(user_routes)
        .merge(management_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(log_error_responses))
        .layer(axum_middleware::from_fn(request_id))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

async fn no_store(response: Response) -> Response {
    with_no_store(response)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(std::time::Duration::from_secs(24 * 60 * 60));

    if config.cors_allow_origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-tab-session"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}
