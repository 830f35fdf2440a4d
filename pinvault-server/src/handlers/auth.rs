//! Account registration, login and PIN handlers.
//!
//! Clients send SHA-256 digests of the master password and PIN; plaintext
//! secrets never reach the server.

use crate::error::ApiError;
use crate::extract::JsonBody;
use axum::extract::State;
use axum::Json;
use pinvault_core::{Database, PinVaultError, User};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub username: String,
    pub master_password_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinLoginRequest {
    pub pin_hash: String,
    /// Restricts the lookup to one user when the client remembers it
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPinRequest {
    pub user_id: i64,
    pub pin_hash: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: User,
    pub has_pin: bool,
}

pub async fn register(
    State(db): State<Database>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if req.username.trim().is_empty() || req.master_password_hash.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = db.create_user(&req.username, &req.master_password_hash)?;
    tracing::info!(user_id = user.id, "User registered");

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

pub async fn login(
    State(db): State<Database>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, has_pin) = db
        .authenticate(&req.username, &req.master_password_hash)?
        .ok_or(PinVaultError::InvalidCredentials)?;

    Ok(Json(LoginResponse {
        success: true,
        user,
        has_pin,
    }))
}

pub async fn login_pin(
    State(db): State<Database>,
    JsonBody(req): JsonBody<PinLoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = db
        .find_user_by_pin(&req.pin_hash, req.user_id)?
        .ok_or(PinVaultError::InvalidPin)?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

pub async fn setup_pin(
    State(db): State<Database>,
    JsonBody(req): JsonBody<SetupPinRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.pin_hash.is_empty() {
        return Err(ApiError::BadRequest("PIN is required".to_string()));
    }

    db.set_pin(req.user_id, &req.pin_hash)?;
    tracing::info!(user_id = req.user_id, "PIN set");

    Ok(Json(serde_json::json!({ "success": true })))
}
