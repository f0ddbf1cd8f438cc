//! User profile, signup and login routes.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use rootedlane_core::ID_FIELD;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::services::users::{
    LoginRequest, ProfileRequest, SignupRequest, validate_login, validate_signup,
};
use crate::state::AppState;

/// Response from creating a profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Create a user profile (name and email only).
///
/// POST /api/user
///
/// Without a database the profile lands in the mock `users` collection.
pub async fn create_profile(
    State(state): State<AppState>,
    body: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    let Json(request) = body?;
    let user = state.users().create_profile(&request).await?;

    let field = |key: &str| user.get_str(key).unwrap_or_default().to_string();
    let response = ProfileResponse {
        success: true,
        id: field(ID_FIELD),
        name: field("name"),
        email: field("email"),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Register a user with a password.
///
/// POST /api/users/signup
///
/// In fallback mode nothing is stored; the request is validated and echoed.
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(request) = body?;

    if !state.is_persistent() {
        let fields = validate_signup(&request)?;
        tracing::info!("signup accepted without persistence (fallback mode)");
        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "User created (fallback)",
                "username": fields.name,
                "email": fields.email,
            })),
        ));
    }

    let user = state.users().signup(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "userId": user.id,
        })),
    ))
}

/// Log in with email and password.
///
/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = body?;

    if !state.is_persistent() {
        validate_login(&request)?;
        return Err(AppError::NotImplemented(
            "Login not available in fallback mode".to_string(),
        ));
    }

    let user = state.users().login(&request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": user,
    })))
}
