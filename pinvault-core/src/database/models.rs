//! Database models for users and credential rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered vault user
///
/// Digests are kept out of this type; they only live in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// A stored credential row
///
/// `encrypted_password` is always ciphertext produced by the secret codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: i64,
    pub user_id: i64,
    pub platform: String,
    pub account_name: String,
    pub username: String,
    pub encrypted_password: String,
    pub notes: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// The replaceable columns of a credential row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFields {
    pub platform: String,
    pub account_name: String,
    pub username: String,
    pub encrypted_password: String,
    pub notes: String,
    pub category: String,
}
