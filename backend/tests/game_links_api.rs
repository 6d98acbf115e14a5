mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Duration;
use serde_json::json;
use support::{bearer, csrf_cookie, game_link, TestApp, CSRF_TOKEN};
use vocabplay_backend::{
    models::{audit_log::AuditAction, tab_session::TabSessionStatus},
    types::{GameLinkId, UserId},
};

fn set_active_request(
    link_id: &str,
    user_id: UserId,
    tab_session: Option<&str>,
    with_csrf: bool,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(format!("/api/game-links/{}/active", link_id))
        .header("content-type", "application/json")
        .header("authorization", bearer(user_id));
    if with_csrf {
        builder = builder
            .header("x-csrf-token", CSRF_TOKEN)
            .header("cookie", csrf_cookie());
    }
    if let Some(tab_session) = tab_session {
        builder = builder.header("x-tab-session", tab_session);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn owner_can_deactivate_link() {
    let app = TestApp::new();
    let owner = UserId::new();
    let link = game_link(owner, "OWNED1");
    let link_id = link.id;
    app.game_links.put(link);
    let session = app.seed_session(owner, TabSessionStatus::Active, Duration::hours(1));
    app.clock.advance(Duration::minutes(3));

    let response = app
        .send(set_active_request(
            &link_id.to_string(),
            owner,
            Some(&session.id),
            true,
            json!({ "isActive": false, "reason": "end of term" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isActive"], false);
    assert_eq!(response.body["code"], "OWNED1");

    let stored = app.game_links.get(link_id).unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.updated_at, app.clock_now());

    // The tab session gate records activity.
    assert_eq!(
        app.tab_sessions.get(&session.id).unwrap().last_activity_at,
        app.clock_now()
    );

    let updates = app.wait_for_audit(AuditAction::GameLinkUpdated, 1).await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].user_id, Some(owner));
    assert_eq!(updates[0].details["previous"], true);
    assert_eq!(updates[0].details["current"], false);
    assert_eq!(updates[0].details["reason"], "end of term");
}

#[tokio::test]
async fn non_owner_is_forbidden_and_audited() {
    let app = TestApp::new();
    let owner = UserId::new();
    let intruder = UserId::new();
    let link = game_link(owner, "OWNED2");
    let link_id = link.id;
    app.game_links.put(link);
    let session = app.seed_session(intruder, TabSessionStatus::Active, Duration::hours(1));

    let response = app
        .send(set_active_request(
            &link_id.to_string(),
            intruder,
            Some(&session.id),
            true,
            json!({ "isActive": false }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.game_links.get(link_id).unwrap().is_active);

    let attempts = app
        .wait_for_audit(AuditAction::UnauthorizedAccessAttempt, 1)
        .await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].user_id, Some(intruder));
    assert_eq!(attempts[0].details["gameLinkId"], link_id.to_string());
}

#[tokio::test]
async fn missing_or_dead_tab_session_is_unauthorized() {
    let app = TestApp::new();
    let owner = UserId::new();
    let link = game_link(owner, "OWNED3");
    let link_id = link.id.to_string();
    app.game_links.put(link);

    let missing = app
        .send(set_active_request(
            &link_id,
            owner,
            None,
            true,
            json!({ "isActive": false }),
        ))
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let lapsed = app.seed_session(owner, TabSessionStatus::Active, Duration::minutes(1));
    app.clock.advance(Duration::minutes(5));
    let response = app
        .send(set_active_request(
            &link_id,
            owner,
            Some(&lapsed.id),
            true,
            json!({ "isActive": false }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let invalidated = app.seed_session(owner, TabSessionStatus::Invalidated, Duration::hours(1));
    let response = app
        .send(set_active_request(
            &link_id,
            owner,
            Some(&invalidated.id),
            true,
            json!({ "isActive": false }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tab_session_of_another_user_is_unauthorized() {
    let app = TestApp::new();
    let owner = UserId::new();
    let link = game_link(owner, "OWNED5");
    let link_id = link.id;
    app.game_links.put(link);
    let foreign = app.seed_session(UserId::new(), TabSessionStatus::Active, Duration::hours(1));
    app.clock.advance(Duration::minutes(2));

    let response = app
        .send(set_active_request(
            &link_id.to_string(),
            owner,
            Some(&foreign.id),
            true,
            json!({ "isActive": false }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.game_links.get(link_id).unwrap().is_active);

    let untouched = app.tab_sessions.get(&foreign.id).unwrap();
    assert_eq!(untouched.last_activity_at, foreign.last_activity_at);
    assert_eq!(untouched.status, TabSessionStatus::Active);
}

#[tokio::test]
async fn csrf_is_checked_before_the_tab_session() {
    let app = TestApp::new();
    let owner = UserId::new();
    let link = game_link(owner, "OWNED4");
    let link_id = link.id.to_string();
    app.game_links.put(link);
    let session = app.seed_session(owner, TabSessionStatus::Active, Duration::hours(1));

    let response = app
        .send(set_active_request(
            &link_id,
            owner,
            Some(&session.id),
            false,
            json!({ "isActive": false }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Invalid CSRF token");
    assert_eq!(
        app.tab_sessions.get(&session.id).unwrap().last_activity_at,
        session.last_activity_at
    );
}

#[tokio::test]
async fn unknown_or_malformed_link_id() {
    let app = TestApp::new();
    let owner = UserId::new();
    let session = app.seed_session(owner, TabSessionStatus::Active, Duration::hours(1));

    let unknown = app
        .send(set_active_request(
            &GameLinkId::new().to_string(),
            owner,
            Some(&session.id),
            true,
            json!({ "isActive": true }),
        ))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let malformed = app
        .send(set_active_request(
            "not-a-uuid",
            owner,
            Some(&session.id),
            true,
            json!({ "isActive": true }),
        ))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlong_reason_fails_validation() {
    let app = TestApp::new();
    let owner = UserId::new();
    let link = game_link(owner, "OWNED5");
    let link_id = link.id.to_string();
    app.game_links.put(link);
    let session = app.seed_session(owner, TabSessionStatus::Active, Duration::hours(1));

    let response = app
        .send(set_active_request(
            &link_id,
            owner,
            Some(&session.id),
            true,
            json!({ "isActive": false, "reason": "x".repeat(501) }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn csrf_token_endpoint_sets_matching_cookie() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .uri("/api/csrf-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let token = response.body["csrfToken"].as_str().expect("token");
    assert_eq!(token.len(), 64);
    assert!(response
        .set_cookies()
        .iter()
        .any(|cookie| cookie.starts_with(&format!("csrf_token={};", token))));
}
