//! Credential CRUD handlers.

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use axum::extract::State;
use axum::Json;
use pinvault_core::crypto::{DEFAULT_PASSWORD_LENGTH, ENCRYPTED_PREFIX};
use pinvault_core::{generate_password, CredentialFields, CredentialRecord, Database};
use serde::{Deserialize, Serialize};

/// Longest password `generate` will produce
pub const MAX_GENERATED_LENGTH: usize = 256;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    pub user_id: i64,
    pub platform: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub username: String,
    pub encrypted_password: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub category: String,
}

impl CredentialPayload {
    fn into_fields(self) -> Result<(i64, CredentialFields), ApiError> {
        if self.platform.trim().is_empty() {
            return Err(ApiError::BadRequest("Platform is required".to_string()));
        }
        // Only codec output is accepted; the store never holds plaintext
        if !self.encrypted_password.starts_with(ENCRYPTED_PREFIX) {
            return Err(ApiError::BadRequest(
                "encryptedPassword must be ciphertext".to_string(),
            ));
        }

        Ok((
            self.user_id,
            CredentialFields {
                platform: self.platform,
                account_name: self.account_name,
                username: self.username,
                encrypted_password: self.encrypted_password,
                notes: self.notes,
                category: self.category,
            },
        ))
    }
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Deserialize)]
pub struct GenerateQuery {
    pub length: Option<usize>,
}

#[derive(Serialize)]
pub struct GeneratedPassword {
    pub password: String,
}

pub async fn list(
    State(db): State<Database>,
    QueryParams(owner): QueryParams<OwnerQuery>,
) -> Result<Json<Vec<CredentialRecord>>, ApiError> {
    Ok(Json(db.list_credentials(owner.user_id)?))
}

pub async fn create(
    State(db): State<Database>,
    JsonBody(payload): JsonBody<CredentialPayload>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let (user_id, fields) = payload.into_fields()?;
    let id = db.insert_credential(user_id, &fields)?;
    tracing::info!(user_id, credential_id = id, "Credential stored");

    Ok(Json(CreatedResponse { success: true, id }))
}

pub async fn update(
    State(db): State<Database>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<CredentialPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (user_id, fields) = payload.into_fields()?;
    db.update_credential(id, user_id, &fields)?;
    tracing::info!(user_id, credential_id = id, "Credential updated");

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete(
    State(db): State<Database>,
    PathParam(id): PathParam<i64>,
    QueryParams(owner): QueryParams<OwnerQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.delete_credential(id, owner.user_id)?;
    tracing::info!(user_id = owner.user_id, credential_id = id, "Credential deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn generate(
    QueryParams(query): QueryParams<GenerateQuery>,
) -> Result<Json<GeneratedPassword>, ApiError> {
    let length = query.length.unwrap_or(DEFAULT_PASSWORD_LENGTH);
    if length > MAX_GENERATED_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "length must be at most {}",
            MAX_GENERATED_LENGTH
        )));
    }

    Ok(Json(GeneratedPassword {
        password: generate_password(length),
    }))
}
