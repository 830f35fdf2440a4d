//! AES-256-GCM encryption of credential plaintext.
//!
//! Uses AES-256-GCM with:
//! - 256-bit key derived from the user secret (see `kdf`)
//! - 96-bit (12 byte) nonce, random for every call
//! - 128-bit authentication tag
//!
//! Ciphertext text format:
//! ```text
//! pv1:<base64(nonce[12] || ciphertext || tag[16])>
//! ```

use crate::crypto::kdf::DerivedKey;
use crate::crypto::password::generate_password;
use crate::crypto::{CryptoError, Result};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// Version prefix of every ciphertext produced by `SecretCodec::encrypt`
pub const ENCRYPTED_PREFIX: &str = "pv1:";

/// Size of an AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of an AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Stateless codec bound to one application salt
///
/// The salt is injected configuration. The codec never stores the user
/// secrets passed to it; each call derives its key and drops it.
#[derive(Clone)]
pub struct SecretCodec {
    app_salt: String,
}

impl SecretCodec {
    /// Create a codec for the given application salt
    pub fn new(app_salt: impl Into<String>) -> Self {
        Self {
            app_salt: app_salt.into(),
        }
    }

    /// Derive the key for `secret` under this codec's salt
    pub fn derive_key(&self, secret: &str) -> DerivedKey {
        DerivedKey::derive(secret, &self.app_salt)
    }

    /// Encrypt `plaintext` under the key derived from `secret`
    ///
    /// Empty plaintext is valid. Two encryptions of the same input differ
    /// because each call draws a fresh nonce from the OS RNG.
    pub fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String> {
        let key = self.derive_key(secret);
        let cipher = Aes256Gcm::new(key.as_bytes().into());

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // AES-GCM appends the auth tag to the ciphertext
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + sealed.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&sealed);

        Ok(format!("{}{}", ENCRYPTED_PREFIX, STANDARD.encode(payload)))
    }

    /// Decrypt a ciphertext produced by `encrypt`
    ///
    /// # Errors
    /// - `MalformedCiphertext` if the text is not in `pv1:` format, is
    ///   truncated, or decrypts to invalid UTF-8
    /// - `AuthenticationFailed` if `secret` is wrong or the data was modified
    pub fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String> {
        let encoded = ciphertext.strip_prefix(ENCRYPTED_PREFIX).ok_or_else(|| {
            CryptoError::MalformedCiphertext("missing version prefix".to_string())
        })?;

        let payload = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::MalformedCiphertext(format!("invalid base64: {}", e)))?;

        if payload.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedCiphertext(format!(
                "payload too short: {} bytes",
                payload.len()
            )));
        }

        let (nonce_bytes, sealed) = payload.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let key = self.derive_key(secret);
        let cipher = Aes256Gcm::new(key.as_bytes().into());

        let plaintext = cipher
            .decrypt(nonce, sealed)
            .map_err(|_| CryptoError::AuthenticationFailed)?;

        String::from_utf8(plaintext).map_err(|_| {
            CryptoError::MalformedCiphertext("plaintext is not valid UTF-8".to_string())
        })
    }

    /// Decrypt, degrading to an empty string on any failure
    ///
    /// For display paths that need some string rather than an error.
    /// Never panics.
    pub fn decrypt_or_empty(&self, ciphertext: &str, secret: &str) -> String {
        self.decrypt(ciphertext, secret).unwrap_or_default()
    }

    /// Digest a login secret or PIN (see `kdf::hash`)
    pub fn hash(&self, text: &str) -> String {
        crate::crypto::kdf::hash(text)
    }

    /// Generate a random password of `length` characters
    pub fn generate_password(&self, length: usize) -> String {
        generate_password(length)
    }
}

impl Default for SecretCodec {
    fn default() -> Self {
        Self::new(crate::crypto::kdf::DEFAULT_APP_SALT)
    }
}

impl fmt::Debug for SecretCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCodec")
            .field("app_salt", &"[REDACTED]")
            .finish()
    }
}
