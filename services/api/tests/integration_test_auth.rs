mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{TestApp, GOOGLE_CODE, GOOGLE_EMAIL, GOOGLE_TOKEN};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_then_signin() {
    let app = TestApp::new();
    let account = app.register("student", "asha@example.com").await;

    let (status, body) = app
        .call(
            "POST",
            "/auth/signin",
            None,
            Some(json!({ "email": "ASHA@example.com", "password": "pa55word" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], account.id.as_str());
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn test_signin_rejects_bad_credentials() {
    let app = TestApp::new();
    app.register("student", "asha@example.com").await;

    let (status, _) = app
        .call(
            "POST",
            "/auth/signin",
            None,
            Some(json!({ "email": "asha@example.com", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            "POST",
            "/auth/signin",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "pa55word" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    app.register("expert", "dup@example.com").await;

    let base = json!({
        "full_name": "Someone",
        "email": "new@example.com",
        "password": "secret",
        "confirm_password": "secret",
        "role": "student",
    });

    let mut duplicate = base.clone();
    duplicate["email"] = json!("dup@example.com");
    let (status, body) = app.call("POST", "/auth/register", None, Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("email"));

    let mut with_phone = base.clone();
    with_phone["email"] = json!("phone.owner@example.com");
    with_phone["phone"] = json!("9876543210");
    let (status, _) = app.call("POST", "/auth/register", None, Some(with_phone)).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut same_phone = base.clone();
    same_phone["phone"] = json!("9876543210");
    let (status, body) = app.call("POST", "/auth/register", None, Some(same_phone)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("phone"));

    let mut mismatch = base.clone();
    mismatch["confirm_password"] = json!("different");
    let (status, _) = app.call("POST", "/auth/register", None, Some(mismatch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut admin = base.clone();
    admin["role"] = json!("admin");
    let (status, _) = app.call("POST", "/auth/register", None, Some(admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_email = base.clone();
    bad_email["email"] = json!("not-an-email");
    let (status, _) = app.call("POST", "/auth/register", None, Some(bad_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_current_user_requires_token() {
    let app = TestApp::new();
    let account = app.register("expert", "rao@example.com").await;

    let (status, body) = app
        .call("GET", "/auth/user", Some(&account.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], account.id.as_str());
    assert_eq!(body["role"], "expert");
    assert_eq!(body["email"], "rao@example.com");

    let (status, _) = app.call("GET", "/auth/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/auth/user", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new();
    let account = app.register("student", "asha@example.com").await;

    let (status, _) = app
        .call("POST", "/auth/logout", Some(&account.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("GET", "/auth/user", Some(&account.access_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_misuse() {
    let app = TestApp::new();
    let account = app.register("student", "asha@example.com").await;

    // A refresh token is not a bearer credential.
    let (status, _) = app
        .call("GET", "/auth/user", Some(&account.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // And an access token cannot refresh.
    let (status, _) = app
        .call(
            "POST",
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": account.access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            "POST",
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": account.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = app.call("GET", "/auth/user", Some(&new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // The used refresh token is spent.
    let (status, _) = app
        .call(
            "POST",
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": account.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_refreshes_issue_one_pair() {
    let app = TestApp::new();
    let account = app.register("student", "asha@example.com").await;
    let body = json!({ "refresh_token": account.refresh_token });

    let (first, second) = tokio::join!(
        app.call("POST", "/auth/refresh", None, Some(body.clone())),
        app.call("POST", "/auth/refresh", None, Some(body.clone())),
    );
    let statuses = [first.0, second.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::UNAUTHORIZED).count(),
        1
    );
}

#[tokio::test]
async fn test_google_token_login_creates_account_once() {
    let app = TestApp::new();

    let (status, first) = app
        .call(
            "POST",
            "/auth/google/login",
            None,
            Some(json!({ "token": GOOGLE_TOKEN, "role": "expert" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["email"], GOOGLE_EMAIL);
    assert_eq!(first["user"]["role"], "expert");

    let (status, second) = app
        .call(
            "POST",
            "/auth/google/login",
            None,
            Some(json!({ "token": GOOGLE_TOKEN })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["user"]["id"], first["user"]["id"]);

    // Google accounts have no password to sign in with.
    let (status, _) = app
        .call(
            "POST",
            "/auth/signin",
            None,
            Some(json!({ "email": GOOGLE_EMAIL, "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            "POST",
            "/auth/google/login",
            None,
            Some(json!({ "token": "forged" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_google_redirect_flow() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/google/login?role=expert")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.contains("state=expert"));

    let (status, body) = app
        .call(
            "GET",
            &format!("/auth/google/callback?code={}&state=expert", GOOGLE_CODE),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "expert");

    let (status, _) = app
        .call("GET", "/auth/google/callback?code=bad", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
