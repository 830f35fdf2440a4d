//! SHA-256 key derivation and one-way digests.
//!
//! The derived key is `SHA-256(secret || app_salt)`. There is no iteration
//! count and no per-user salt; the application salt is shared by every key
//! derived by one `SecretCodec`.
//!
//! Login secrets and PINs are digested with a single unsalted SHA-256 so
//! that stored digests stay comparable with vaults created by earlier
//! clients. This is not a password-storage scheme for a hardened build.

use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Development salt, matching the value shipped with the first web client.
///
/// Deployments should inject their own salt through configuration. Changing
/// it makes every previously stored credential undecryptable.
pub const DEFAULT_APP_SALT: &str = "your-super-secret-key";

/// Symmetric key material derived from a user secret
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Derive a key from `secret` and `app_salt`
    ///
    /// Total over every input, including empty strings.
    pub fn derive(secret: &str, app_salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.update(app_salt.as_bytes());

        Self {
            key: hasher.finalize().into(),
        }
    }

    /// Get the raw key bytes (use sparingly)
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Lowercase hex form of the key
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Digest `text` with a single unsalted SHA-256, returned as lowercase hex
pub fn hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let k1 = DerivedKey::derive("correct-secret", DEFAULT_APP_SALT);
        let k2 = DerivedKey::derive("correct-secret", DEFAULT_APP_SALT);
        assert_eq!(k1, k2);
        assert_eq!(k1.to_hex(), k2.to_hex());
    }

    #[test]
    fn test_derive_matches_concatenated_digest() {
        let key = DerivedKey::derive("1234", "salt");
        assert_eq!(key.to_hex(), hash("1234salt"));
    }

    #[test]
    fn test_derive_depends_on_secret_and_salt() {
        let base = DerivedKey::derive("secret", "salt-a");
        assert_ne!(base, DerivedKey::derive("other", "salt-a"));
        assert_ne!(base, DerivedKey::derive("secret", "salt-b"));
    }

    #[test]
    fn test_derive_accepts_empty_input() {
        let key = DerivedKey::derive("", "");
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
        assert_eq!(
            key.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_deterministic_hex() {
        let digest = hash("123456");
        assert_eq!(digest, hash("123456"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_only_recoverable_by_enumeration() {
        let target = hash("042");
        let found = (0..1000)
            .map(|n| format!("{:03}", n))
            .find(|candidate| hash(candidate) == target);
        assert_eq!(found.as_deref(), Some("042"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = DerivedKey::derive("secret", DEFAULT_APP_SALT);
        let shown = format!("{:?}", key);
        assert!(!shown.contains(&key.to_hex()));
        assert!(shown.contains("REDACTED"));
    }
}
