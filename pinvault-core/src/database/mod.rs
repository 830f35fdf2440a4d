//! Database layer for the password vault.
//!
//! This module handles schema creation and persistence of users and
//! credential rows. Credential passwords arrive here already encrypted.

pub mod models;
pub mod schema;

pub use models::{CredentialFields, CredentialRecord, User};
pub use schema::Database;
