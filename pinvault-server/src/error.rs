//! API error types.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pinvault_core::PinVaultError;

/// API error types mapped to HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    Database(String),
    Auth(String),
    NotFound(String),
    Conflict(String),
    BadRequest(String),
    /// Request could not be parsed; keeps the extractor's status code
    Rejected(StatusCode, String),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Auth(e) => write!(f, "Auth error: {}", e),
            Self::NotFound(e) => write!(f, "Not found: {}", e),
            Self::Conflict(e) => write!(f, "Conflict: {}", e),
            Self::BadRequest(e) => write!(f, "Bad request: {}", e),
            Self::Rejected(status, e) => write!(f, "Rejected ({}): {}", status, e),
            Self::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Database(_) | Self::Internal(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Auth(e) => (StatusCode::UNAUTHORIZED, e.clone()),
            Self::NotFound(e) => (StatusCode::NOT_FOUND, e.clone()),
            Self::Conflict(e) => (StatusCode::CONFLICT, e.clone()),
            Self::BadRequest(e) => (StatusCode::BAD_REQUEST, e.clone()),
            Self::Rejected(status, e) => (*status, e.clone()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<PinVaultError> for ApiError {
    fn from(e: PinVaultError) -> Self {
        match e {
            PinVaultError::UsernameTaken => Self::Conflict("Username already exists".to_string()),
            PinVaultError::InvalidCredentials => {
                Self::Auth("Invalid username or password".to_string())
            }
            PinVaultError::InvalidPin => Self::Auth("Invalid PIN".to_string()),
            PinVaultError::VaultLocked => Self::Auth("Vault is locked".to_string()),
            PinVaultError::NotFound(what) => Self::NotFound(format!("Not found: {}", what)),
            PinVaultError::InvalidInput(msg) => Self::BadRequest(msg),
            PinVaultError::Database(msg) => Self::Database(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}
