mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Duration;
use support::{bearer, TestApp};
use vocabplay_backend::{
    models::{audit_log::AuditAction, tab_session::TabSessionStatus},
    types::UserId,
};

fn logout_request(user_id: Option<UserId>, tab_session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header("user-agent", "logout-test")
        .header("x-forwarded-for", "198.51.100.9");
    if let Some(user_id) = user_id {
        builder = builder.header("authorization", bearer(user_id));
    }
    if let Some(tab_session) = tab_session {
        builder = builder.header("x-tab-session", tab_session);
    }
    builder.body(Body::empty()).unwrap()
}

fn clears_access_cookie(cookies: &[String]) -> bool {
    cookies
        .iter()
        .any(|cookie| cookie.starts_with("access_token=;") && cookie.contains("Max-Age=0"))
}

#[tokio::test]
async fn logout_without_any_session_still_succeeds() {
    let app = TestApp::new();

    let response = app.send(logout_request(None, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert!(clears_access_cookie(&response.set_cookies()));

    app.settle().await;
    assert!(app.audit_logs.entries_for(AuditAction::Logout).is_empty());
}

#[tokio::test]
async fn logout_invalidates_tab_session_and_audits() {
    let app = TestApp::new();
    let user_id = UserId::new();
    let session = app.seed_session(user_id, TabSessionStatus::Active, Duration::hours(1));

    let response = app
        .send(logout_request(Some(user_id), Some(&session.id)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(clears_access_cookie(&response.set_cookies()));
    assert_eq!(
        app.tab_sessions.get(&session.id).unwrap().status,
        TabSessionStatus::Invalidated
    );

    let logouts = app.wait_for_audit(AuditAction::Logout, 1).await;
    assert_eq!(logouts.len(), 1);
    assert_eq!(logouts[0].user_id, Some(user_id));
    assert_eq!(logouts[0].ip_address, "198.51.100.9");
    assert_eq!(logouts[0].user_agent, "logout-test");
    assert_eq!(logouts[0].details["tabSessionInvalidated"], true);
    assert!(logouts[0].request_id.is_some());
}

#[tokio::test]
async fn repeated_logout_is_idempotent() {
    let app = TestApp::new();
    let user_id = UserId::new();
    let session = app.seed_session(user_id, TabSessionStatus::Active, Duration::hours(1));

    for _ in 0..2 {
        let response = app
            .send(logout_request(Some(user_id), Some(&session.id)))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    app.wait_for_audit(AuditAction::Logout, 2).await;
    app.settle().await;
    assert_eq!(
        app.audit_logs
            .entries_for(AuditAction::SessionInvalidated)
            .len(),
        1
    );
}

#[tokio::test]
async fn logout_completes_when_stores_are_down() {
    let app = TestApp::new();
    let user_id = UserId::new();
    let session = app.seed_session(user_id, TabSessionStatus::Active, Duration::hours(1));
    app.tab_sessions.set_offline(true);
    app.audit_logs.set_offline(true);

    let response = app
        .send(logout_request(Some(user_id), Some(&session.id)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(clears_access_cookie(&response.set_cookies()));
}

#[tokio::test]
async fn logout_with_invalid_token_still_clears_cookie() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(clears_access_cookie(&response.set_cookies()));
}
