/// Routing, authentication and validation checks that never reach the database

mod common;

use axum::http::StatusCode;
use common::{access_token, offline_app, send};
use serde_json::json;

fn signup_body(age: i64, password2: &str) -> serde_json::Value {
    json!({
        "username": "ada",
        "password": "orbital-rendezvous",
        "password2": password2,
        "age": age,
        "can_be_contacted": true,
        "can_data_be_shared": false
    })
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = offline_app();

    for uri in ["/users/", "/projects/", "/projects/1/issues/", "/projects/1/issues/1/comments/"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_malformed_and_forged_tokens_rejected() {
    let app = offline_app();

    let (status, _) = send(&app, "GET", "/projects/", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let claims = softdesk_shared::auth::jwt::Claims::new(
        1,
        false,
        softdesk_shared::auth::jwt::TokenType::Access,
        chrono::Duration::minutes(5),
    );
    let forged = softdesk_shared::auth::jwt::create_token(
        &claims,
        "some-other-secret-that-is-long-enough",
    )
    .unwrap();

    let (status, _) = send(&app, "GET", "/projects/", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_not_accepted_as_access() {
    let app = offline_app();

    let claims = softdesk_shared::auth::jwt::Claims::new(
        1,
        false,
        softdesk_shared::auth::jwt::TokenType::Refresh,
        chrono::Duration::hours(1),
    );
    let refresh = softdesk_shared::auth::jwt::create_token(&claims, common::TEST_SECRET).unwrap();

    let (status, _) = send(&app, "GET", "/users/", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsupported_verbs_answer_405() {
    let app = offline_app();
    let token = access_token(1, false);

    let cases = [
        ("POST", "/users/"),
        ("DELETE", "/users/1/"),
        ("PUT", "/projects/"),
        ("PATCH", "/projects/1/contributors/2/"),
        ("DELETE", "/projects/1/issues/"),
    ];

    for (method, uri) in cases {
        let (status, body) = send(&app, method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, uri);
        assert_eq!(body["error"], "method_not_allowed");
    }

    let (status, _) = send(&app, "GET", "/signup/", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_signup_rejects_underage() {
    let app = offline_app();

    let (status, body) = send(
        &app,
        "POST",
        "/signup/",
        None,
        Some(signup_body(14, "orbital-rendezvous")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "age");
}

#[tokio::test]
async fn test_signup_rejects_password_mismatch() {
    let app = offline_app();

    let (status, body) = send(
        &app,
        "POST",
        "/signup/",
        None,
        Some(signup_body(30, "orbital-rendezvouz")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["password"]);
}

#[tokio::test]
async fn test_missing_signup_field_reported_per_field() {
    let app = offline_app();

    let body = json!({
        "username": "ada",
        "password": "orbital-rendezvous",
        "password2": "orbital-rendezvous"
    });
    let (status, body) = send(&app, "POST", "/signup/", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "age");
    assert_eq!(body["details"][0]["message"], "This field is required.");
}

#[tokio::test]
async fn test_non_object_body_is_bad_request() {
    let app = offline_app();

    let (status, body) = send(&app, "POST", "/signup/", None, Some(json!("ada"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_update_of_other_user_forbidden_before_body_checks() {
    let app = offline_app();
    let token = access_token(1, false);

    // Neither a partial PUT nor a mistyped field reveals anything about user 2
    let (status, _) = send(&app, "PUT", "/users/2/", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PATCH", "/users/2/", Some(&token), Some(json!({ "age": "old" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = offline_app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}
