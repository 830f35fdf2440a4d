//! Database schema, connection management and row operations.

use crate::database::models::{CredentialFields, CredentialRecord, User};
use crate::{PinVaultError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Thread-safe handle to the vault database
///
/// Cloning the handle shares the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create a new in-memory database for testing
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                master_password_hash TEXT NOT NULL,
                pin_hash TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS passwords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                platform TEXT NOT NULL,
                account_name TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL DEFAULT '',
                encrypted_password TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_passwords_user_created
                ON passwords(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_users_pin_hash
                ON users(pin_hash);",
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PinVaultError::Database(format!("Lock error: {}", e)))
    }

    /// Register a user; usernames are unique
    pub fn create_user(&self, username: &str, master_password_hash: &str) -> Result<User> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO users (username, master_password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, master_password_hash, now],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => PinVaultError::UsernameTaken,
            _ => PinVaultError::from(e),
        })?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            created_at: timestamp_to_datetime(now),
        })
    }

    /// Look up a user by username and master password digest
    ///
    /// Returns the user and whether a PIN has been set.
    pub fn authenticate(
        &self,
        username: &str,
        master_password_hash: &str,
    ) -> Result<Option<(User, bool)>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, username, created_at, pin_hash IS NOT NULL FROM users
                 WHERE username = ?1 AND master_password_hash = ?2",
                params![username, master_password_hash],
                |row| Ok((user_from_row(row)?, row.get(3)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Look up a user by username alone
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<(User, bool)>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, username, created_at, pin_hash IS NOT NULL FROM users
                 WHERE username = ?1",
                [username],
                |row| Ok((user_from_row(row)?, row.get(3)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Find the user owning a PIN digest
    ///
    /// With `scope`, only that user can match. Without it the lowest user
    /// id sharing the digest wins.
    pub fn find_user_by_pin(&self, pin_hash: &str, scope: Option<i64>) -> Result<Option<User>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, username, created_at FROM users
                 WHERE pin_hash = ?1 AND (?2 IS NULL OR id = ?2)
                 ORDER BY id LIMIT 1",
                params![pin_hash, scope],
                user_from_row,
            )
            .optional()?;
        Ok(found)
    }

    /// Set or replace a user's PIN digest
    pub fn set_pin(&self, user_id: i64, pin_hash: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET pin_hash = ?1 WHERE id = ?2",
            params![pin_hash, user_id],
        )?;

        if changed == 0 {
            return Err(PinVaultError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    /// Swap a user's PIN digest and rewrite credential ciphertexts in one
    /// transaction
    ///
    /// Either every row in `ciphertexts` is rewritten and the PIN replaced,
    /// or nothing changes.
    pub fn rekey_credentials(
        &self,
        user_id: i64,
        ciphertexts: &[(i64, String)],
        pin_hash: &str,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for (id, encrypted_password) in ciphertexts {
            let changed = tx.execute(
                "UPDATE passwords SET encrypted_password = ?1 WHERE id = ?2 AND user_id = ?3",
                params![encrypted_password, id, user_id],
            )?;
            if changed == 0 {
                return Err(PinVaultError::NotFound(format!("credential {}", id)));
            }
        }

        let changed = tx.execute(
            "UPDATE users SET pin_hash = ?1 WHERE id = ?2",
            params![pin_hash, user_id],
        )?;
        if changed == 0 {
            return Err(PinVaultError::NotFound(format!("user {}", user_id)));
        }

        tx.commit()?;
        Ok(())
    }

    /// All credentials of a user, newest first
    pub fn list_credentials(&self, user_id: i64) -> Result<Vec<CredentialRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, platform, account_name, username, encrypted_password,
                    notes, category, created_at
             FROM passwords WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let records = stmt
            .query_map([user_id], credential_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Get a single credential by id
    pub fn get_credential(&self, id: i64) -> Result<CredentialRecord> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, user_id, platform, account_name, username, encrypted_password,
                    notes, category, created_at
             FROM passwords WHERE id = ?1",
            [id],
            credential_from_row,
        )
        .optional()?
        .ok_or_else(|| PinVaultError::NotFound(format!("credential {}", id)))
    }

    /// Insert a credential row for `user_id`, returning its id
    pub fn insert_credential(&self, user_id: i64, fields: &CredentialFields) -> Result<i64> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO passwords (user_id, platform, account_name, username,
                                    encrypted_password, notes, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id,
                fields.platform,
                fields.account_name,
                fields.username,
                fields.encrypted_password,
                fields.notes,
                fields.category,
                now,
            ],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                PinVaultError::NotFound(format!("user {}", user_id))
            }
            _ => PinVaultError::from(e),
        })?;

        Ok(conn.last_insert_rowid())
    }

    /// Replace every mutable column of a credential owned by `user_id`
    pub fn update_credential(
        &self,
        id: i64,
        user_id: i64,
        fields: &CredentialFields,
    ) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE passwords
             SET platform = ?1, account_name = ?2, username = ?3,
                 encrypted_password = ?4, notes = ?5, category = ?6
             WHERE id = ?7 AND user_id = ?8",
            params![
                fields.platform,
                fields.account_name,
                fields.username,
                fields.encrypted_password,
                fields.notes,
                fields.category,
                id,
                user_id,
            ],
        )?;

        if changed == 0 {
            return Err(PinVaultError::NotFound(format!("credential {}", id)));
        }
        Ok(())
    }

    /// Delete a credential owned by `user_id`
    pub fn delete_credential(&self, id: i64, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM passwords WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(PinVaultError::NotFound(format!("credential {}", id)));
        }
        Ok(())
    }
}

fn constraint_code(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(err.extended_code)
        }
        _ => None,
    }
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: timestamp_to_datetime(row.get(2)?),
    })
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
    Ok(CredentialRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: row.get(2)?,
        account_name: row.get(3)?,
        username: row.get(4)?,
        encrypted_password: row.get(5)?,
        notes: row.get(6)?,
        category: row.get(7)?,
        created_at: timestamp_to_datetime(row.get(8)?),
    })
}
