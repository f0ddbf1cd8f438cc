//! Behavior with no database configured.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rootedlane_integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_db_reports_fallback_mode() {
    let app = TestApp::fallback();

    let response = app.get("/api/test-db").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(
        response.body["message"],
        "No database configured, running in fallback mode"
    );
}

#[tokio::test]
async fn signup_echoes_without_storing() {
    let app = TestApp::fallback();

    let response = app
        .post(
            "/api/users/signup",
            &json!({"username": "u1", "email": "u1@x.com", "password": "p"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["message"], "User created (fallback)");
    assert_eq!(response.body["username"], "u1");
    assert_eq!(response.body["email"], "u1@x.com");
    assert!(response.body.get("password").is_none());

    // Nothing was persisted
    let users = app.get("/users").await;
    assert!(users.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn signup_still_validates() {
    let app = TestApp::fallback();

    let response = app
        .post("/api/users/signup", &json!({"username": "u1"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "All fields are required");
}

#[tokio::test]
async fn login_is_not_available() {
    let app = TestApp::fallback();

    let response = app
        .post(
            "/api/users/login",
            &json!({"email": "u1@x.com", "password": "p"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(response.body["success"], false);
    assert_eq!(
        response.body["message"],
        "Login not available in fallback mode"
    );

    // Missing fields are reported before the mode
    let response = app.post("/api/users/login", &json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn durable_routes_use_memory() {
    let app = TestApp::fallback();

    let created = app.post("/products", &json!({"name": "Mug"})).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_str().unwrap();

    let fetched = app.get(&format!("/products/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["name"], "Mug");
}

#[tokio::test]
async fn create_profile_uses_memory() {
    let app = TestApp::fallback();

    let first = app
        .post("/api/user", &json!({"name": "Ada", "email": "ada@x.com"}))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert!(first.body["_id"].is_string());

    let second = app
        .post("/api/user", &json!({"name": "Ada", "email": "ada@x.com"}))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn readiness_is_ok_without_database() {
    let app = TestApp::fallback();
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}
