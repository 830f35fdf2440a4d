//! Secret codec for the password vault.
//!
//! This module provides:
//! - SHA-256 key derivation from a user secret and the application salt
//! - AES-256-GCM encryption of credential plaintext into transportable text
//! - Unsalted SHA-256 digests for login secrets and PINs
//! - Random password generation from a CSPRNG
//! - Zeroizing holders for in-memory secrets

pub mod cipher;
pub mod kdf;
pub mod password;
pub mod zero;

pub use cipher::{SecretCodec, ENCRYPTED_PREFIX, NONCE_SIZE, TAG_SIZE};
pub use kdf::{hash, DerivedKey, DEFAULT_APP_SALT, KEY_SIZE};
pub use password::{generate_password, generate_password_with, CHARSET, DEFAULT_PASSWORD_LENGTH};
pub use zero::SecretText;

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Input is not something `SecretCodec::encrypt` produced.
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Wrong secret, or the ciphertext was modified after encryption.
    #[error("Authentication failed - wrong secret or tampered data")]
    AuthenticationFailed,
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;
/// Alias for Result used by callers outside this module
pub type CryptoResult<T> = Result<T>;
