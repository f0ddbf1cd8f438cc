//! Profile creation, signup and login.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rootedlane_integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn signup_then_login() {
    let app = TestApp::durable();

    let signup = app
        .post(
            "/api/users/signup",
            &json!({"username": "u1", "email": "u1@x.com", "password": "p"}),
        )
        .await;
    assert_eq!(signup.status, StatusCode::CREATED);
    assert_eq!(signup.body["success"], true);
    assert_eq!(signup.body["message"], "User created successfully");
    let user_id = signup.body["userId"].as_str().unwrap().to_string();

    let login = app
        .post(
            "/api/users/login",
            &json!({"email": "u1@x.com", "password": "p"}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["success"], true);
    assert_eq!(login.body["message"], "Login successful");
    assert_eq!(login.body["user"]["email"], "u1@x.com");
    assert_eq!(login.body["user"]["username"], "u1");
    assert_eq!(login.body["user"]["id"], user_id.as_str());
    assert!(login.body["user"].get("password").is_none());
}

#[tokio::test]
async fn signup_accepts_name_instead_of_username() {
    let app = TestApp::durable();

    let signup = app
        .post(
            "/api/users/signup",
            &json!({"name": "Ada", "email": "ada@x.com", "password": "p"}),
        )
        .await;
    assert_eq!(signup.status, StatusCode::CREATED);
}

#[tokio::test]
async fn signup_requires_all_fields() {
    let app = TestApp::durable();

    for body in [
        json!({"email": "a@x.com", "password": "p"}),
        json!({"username": "u", "password": "p"}),
        json!({"username": "u", "email": "a@x.com"}),
        json!({"username": "", "email": "a@x.com", "password": "p"}),
        json!({}),
    ] {
        let response = app.post("/api/users/signup", &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["message"], "All fields are required");
    }
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let app = TestApp::durable();
    let body = json!({"username": "u1", "email": "dup@x.com", "password": "p"});

    assert_eq!(
        app.post("/api/users/signup", &body).await.status,
        StatusCode::CREATED
    );

    let second = app.post("/api/users/signup", &body).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["message"], "User already exists");
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let app = TestApp::durable();
    app.post(
        "/api/users/signup",
        &json!({"username": "u1", "email": "u1@x.com", "password": "p"}),
    )
    .await;

    let wrong_password = app
        .post(
            "/api/users/login",
            &json!({"email": "u1@x.com", "password": "nope"}),
        )
        .await;
    let unknown_email = app
        .post(
            "/api/users/login",
            &json!({"email": "ghost@x.com", "password": "p"}),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["message"], "Invalid email or password");
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = TestApp::durable();

    let response = app
        .post("/api/users/login", &json!({"email": "u1@x.com"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Email and password are required");
}

#[tokio::test]
async fn create_profile_conflicts_on_same_email() {
    let app = TestApp::durable();

    let first = app
        .post("/api/user", &json!({"name": "Ada", "email": "ada@x.com"}))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["success"], true);
    assert_eq!(first.body["name"], "Ada");
    assert_eq!(first.body["email"], "ada@x.com");
    let first_id = first.body["_id"].as_str().unwrap().to_string();

    let duplicate = app
        .post("/api/user", &json!({"name": "Ada", "email": "ada@x.com"}))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["message"], "User already exists");

    let other = app
        .post("/api/user", &json!({"name": "Ada", "email": "ada2@x.com"}))
        .await;
    assert_eq!(other.status, StatusCode::CREATED);
    assert_ne!(other.body["_id"], first_id.as_str());
}

#[tokio::test]
async fn create_profile_requires_name_and_email() {
    let app = TestApp::durable();

    let response = app.post("/api/user", &json!({"name": "Ada"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Name and email are required");
}

#[tokio::test]
async fn profile_and_signup_share_email_uniqueness() {
    let app = TestApp::durable();

    app.post("/api/user", &json!({"name": "Ada", "email": "ada@x.com"}))
        .await;

    let signup = app
        .post(
            "/api/users/signup",
            &json!({"username": "ada", "email": "ada@x.com", "password": "p"}),
        )
        .await;
    assert_eq!(signup.status, StatusCode::CONFLICT);
}
