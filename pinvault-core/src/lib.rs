//! PinVault Core Library
//!
//! This library provides the core functionality for the password vault:
//! the secret codec, the SQLite credential store, and the session
//! controller that ties them together.

pub mod crypto;
pub mod database;
pub mod platform;
pub mod vault;

pub use crypto::{
    generate_password, hash, CryptoError, CryptoResult, DerivedKey, SecretCodec, SecretText,
    DEFAULT_APP_SALT, DEFAULT_PASSWORD_LENGTH,
};
pub use database::{CredentialFields, CredentialRecord, Database, User};
pub use platform::{get_config_dir, get_data_dir, get_default_vault_path};
pub use vault::{CredentialDraft, SessionState, VaultSession};

use thiserror::Error;

/// Result type for vault operations
pub type Result<T> = std::result::Result<T, PinVaultError>;

/// General error type for vault operations
#[derive(Error, Debug)]
pub enum PinVaultError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Vault is locked")]
    VaultLocked,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for PinVaultError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}
