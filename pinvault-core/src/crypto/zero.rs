//! Zeroizing holder for in-memory secrets.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string that is zeroized when dropped
///
/// Used for the master password or PIN-derived token held by an unlocked
/// session. `Debug` never prints the contents.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretText {
    text: String,
}

impl SecretText {
    /// Wrap a secret
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Borrow the secret (use carefully!)
    pub fn expose(&self) -> &str {
        &self.text
    }

    /// Get the length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for SecretText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for SecretText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Debug for SecretText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretText([REDACTED])")
    }
}
