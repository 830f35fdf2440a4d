//! Vault session - coordinates the secret codec and the credential store
//!
//! A `VaultSession` holds the live user secret between unlock and lock.
//! Every credential write goes through the codec before it reaches the
//! database, and every reveal decrypts on the way out.


use crate::{
    crypto::{hash, SecretCodec, SecretText},
    database::{CredentialFields, CredentialRecord, Database, User},
    PinVaultError, Result,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Number of digits in a vault PIN
pub const PIN_LENGTH: usize = 6;

/// Appended to a PIN to form the session secret of a PIN unlock
pub const PIN_SESSION_SUFFIX: &str = "_vault_key";

/// Platforms shown even before the user stores anything for them
pub const DEFAULT_PLATFORMS: &[&str] = &[
    "Facebook", "Instagram", "Twitter", "TikTok", "YouTube", "Gmail", "LinkedIn", "Spotify",
    "Netflix", "Amazon", "Apple", "Microsoft", "GitHub", "Discord", "Slack", "Pinterest",
    "Reddit", "Snapchat", "WhatsApp", "Telegram", "PayPal", "Binance", "Coinbase", "Dropbox",
    "Zoom",
];

/// Where a session is in the login flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No user known
    LoggedOut,
    /// User identified; a PIN must be created or entered
    PinRequired { user: User, has_pin: bool },
    /// Secret available, credentials can be read and written
    Unlocked { user: User },
}

/// A credential as the user edits it, with the password in plaintext
#[derive(Debug, Clone)]
pub struct CredentialDraft {
    pub platform: String,
    pub account_name: String,
    pub username: String,
    pub password: SecretText,
    pub notes: String,
    pub category: String,
}

/// Session controller for one user of the vault
pub struct VaultSession {
    db: Database,
    codec: SecretCodec,
    state: SessionState,
    secret: Option<SecretText>,
}

impl VaultSession {
    /// Create a logged-out session over `db`
    pub fn new(db: Database, codec: SecretCodec) -> Self {
        Self {
            db,
            codec,
            state: SessionState::LoggedOut,
            secret: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The user this session belongs to, if one is known
    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::LoggedOut => None,
            SessionState::PinRequired { user, .. } | SessionState::Unlocked { user } => Some(user),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, SessionState::Unlocked { .. }) && self.secret.is_some()
    }

    /// Create an account and keep its master password as the session secret
    pub fn register(&mut self, username: &str, master_password: &str) -> Result<User> {
        if username.trim().is_empty() {
            return Err(PinVaultError::InvalidInput("Username is required".to_string()));
        }
        if master_password.is_empty() {
            return Err(PinVaultError::InvalidInput(
                "Master password is required".to_string(),
            ));
        }

        let user = self.db.create_user(username, &hash(master_password))?;
        info!(user_id = user.id, "Registered vault user");

        self.secret = Some(SecretText::new(master_password));
        self.state = SessionState::PinRequired {
            user: user.clone(),
            has_pin: false,
        };
        Ok(user)
    }

    /// Log in with a master password; a PIN step follows
    pub fn login(&mut self, username: &str, master_password: &str) -> Result<(User, bool)> {
        let Some((user, has_pin)) = self.db.authenticate(username, &hash(master_password))? else {
            warn!("Rejected master password login");
            return Err(PinVaultError::InvalidCredentials);
        };
        info!(user_id = user.id, has_pin, "Master password accepted");

        self.secret = Some(SecretText::new(master_password));
        self.state = SessionState::PinRequired {
            user: user.clone(),
            has_pin,
        };
        Ok((user, has_pin))
    }

    /// Resume a remembered user at the PIN step, without any secret
    pub fn resume(&mut self, user: User, has_pin: bool) {
        self.secret = None;
        self.state = SessionState::PinRequired { user, has_pin };
    }

    /// Create the first PIN and unlock the vault
    ///
    /// Needs the master password from `register` or `login`; the session
    /// secret stays the master password. A user who already has a PIN must
    /// go through `change_pin`, which carries stored entries over.
    pub fn setup_pin(&mut self, pin: &str) -> Result<()> {
        validate_pin(pin)?;

        let user = match &self.state {
            SessionState::PinRequired { user, .. } | SessionState::Unlocked { user }
                if self.secret.is_some() =>
            {
                user.clone()
            }
            _ => return Err(PinVaultError::VaultLocked),
        };

        if self.user_has_pin(&user)? {
            return Err(PinVaultError::InvalidInput(
                "PIN already set; change it with the current PIN".to_string(),
            ));
        }

        self.db.set_pin(user.id, &hash(pin))?;
        info!(user_id = user.id, "PIN set");

        self.state = SessionState::Unlocked { user };
        Ok(())
    }

    /// Create the first PIN and switch straight to the PIN-derived secret
    ///
    /// Entries saved afterwards open on every later PIN unlock.
    pub fn enroll_pin(&mut self, pin: &str) -> Result<User> {
        self.setup_pin(pin)?;
        self.unlock_with_pin(pin)
    }

    /// Replace the PIN and re-encrypt the user's entries under the new one
    ///
    /// Entries sealed with the old PIN token, or with the master password
    /// when the session holds it, are rewritten for the new PIN token. Rows
    /// that open under neither are left untouched. All rewrites and the PIN
    /// swap commit together. Returns the number of rewritten entries.
    pub fn change_pin(&mut self, old_pin: &str, new_pin: &str) -> Result<usize> {
        validate_pin(old_pin)?;
        validate_pin(new_pin)?;

        let Some(user) = self.current_user().cloned() else {
            return Err(PinVaultError::VaultLocked);
        };
        if self.db.find_user_by_pin(&hash(old_pin), Some(user.id))?.is_none() {
            warn!(user_id = user.id, "Rejected PIN change");
            return Err(PinVaultError::InvalidPin);
        }

        let old_token = pin_session_secret(old_pin);
        let new_token = pin_session_secret(new_pin);
        let mut candidates = vec![old_token.expose()];
        if let Some(secret) = &self.secret {
            if secret.expose() != old_token.expose() {
                candidates.push(secret.expose());
            }
        }

        let mut rewritten = Vec::new();
        let mut skipped = 0usize;
        for record in self.db.list_credentials(user.id)? {
            let opened = candidates
                .iter()
                .find_map(|secret| self.codec.decrypt(&record.encrypted_password, secret).ok());
            match opened {
                Some(plaintext) => {
                    let plaintext = SecretText::new(plaintext);
                    let sealed = self.codec.encrypt(plaintext.expose(), new_token.expose())?;
                    rewritten.push((record.id, sealed));
                }
                None => skipped += 1,
            }
        }

        self.db.rekey_credentials(user.id, &rewritten, &hash(new_pin))?;
        info!(
            user_id = user.id,
            rewritten = rewritten.len(),
            skipped,
            "PIN changed"
        );

        self.secret = Some(new_token);
        self.state = SessionState::Unlocked { user };
        Ok(rewritten.len())
    }

    /// Unlock with a PIN
    ///
    /// The lookup is scoped to the known user when there is one. On success
    /// the session secret becomes the PIN-derived token, which differs from
    /// the master password: credentials saved under one cannot be read
    /// under the other.
    pub fn unlock_with_pin(&mut self, pin: &str) -> Result<User> {
        validate_pin(pin)?;

        let scope = self.current_user().map(|u| u.id);
        let Some(user) = self.db.find_user_by_pin(&hash(pin), scope)? else {
            warn!(?scope, "Rejected PIN unlock");
            return Err(PinVaultError::InvalidPin);
        };
        info!(user_id = user.id, "Vault unlocked with PIN");

        self.secret = Some(pin_session_secret(pin));
        self.state = SessionState::Unlocked { user: user.clone() };
        Ok(user)
    }

    /// Drop the secret and go back to the PIN step
    pub fn lock(&mut self) {
        self.secret = None;
        if let SessionState::Unlocked { user } = &self.state {
            let user = user.clone();
            debug!(user_id = user.id, "Vault locked");
            self.state = SessionState::PinRequired {
                user,
                has_pin: true,
            };
        }
    }

    /// Drop the secret and forget the user
    pub fn logout(&mut self) {
        self.secret = None;
        self.state = SessionState::LoggedOut;
    }

    fn user_has_pin(&self, user: &User) -> Result<bool> {
        Ok(self
            .db
            .find_user_by_username(&user.username)?
            .is_some_and(|(_, has_pin)| has_pin))
    }

    fn unlocked_user(&self) -> Result<&User> {
        match &self.state {
            SessionState::Unlocked { user } => Ok(user),
            _ => Err(PinVaultError::VaultLocked),
        }
    }

    /// The live secret; there is no fallback when none is held
    fn require_secret(&self) -> Result<&str> {
        self.unlocked_user()?;
        self.secret
            .as_ref()
            .map(SecretText::expose)
            .ok_or(PinVaultError::VaultLocked)
    }

    fn seal(&self, draft: &CredentialDraft) -> Result<CredentialFields> {
        if draft.platform.trim().is_empty() {
            return Err(PinVaultError::InvalidInput("Platform is required".to_string()));
        }

        let secret = self.require_secret()?;
        let encrypted_password = self.codec.encrypt(draft.password.expose(), secret)?;

        Ok(CredentialFields {
            platform: draft.platform.clone(),
            account_name: draft.account_name.clone(),
            username: draft.username.clone(),
            encrypted_password,
            notes: draft.notes.clone(),
            category: draft.category.clone(),
        })
    }

    /// Encrypt and store a new credential, returning its id
    pub fn save_credential(&self, draft: &CredentialDraft) -> Result<i64> {
        let fields = self.seal(draft)?;
        let user = self.unlocked_user()?;

        let id = self.db.insert_credential(user.id, &fields)?;
        info!(user_id = user.id, credential_id = id, "Credential saved");
        Ok(id)
    }

    /// Re-encrypt and replace an existing credential
    pub fn update_credential(&self, id: i64, draft: &CredentialDraft) -> Result<()> {
        let fields = self.seal(draft)?;
        let user = self.unlocked_user()?;

        self.db.update_credential(id, user.id, &fields)?;
        info!(user_id = user.id, credential_id = id, "Credential updated");
        Ok(())
    }

    pub fn delete_credential(&self, id: i64) -> Result<()> {
        let user = self.unlocked_user()?;
        self.db.delete_credential(id, user.id)?;
        info!(user_id = user.id, credential_id = id, "Credential deleted");
        Ok(())
    }

    /// Stored credentials, newest first, passwords still encrypted
    pub fn credentials(&self) -> Result<Vec<CredentialRecord>> {
        let user = self.unlocked_user()?;
        self.db.list_credentials(user.id)
    }

    /// Fetch one credential owned by the session user
    pub fn credential(&self, id: i64) -> Result<CredentialRecord> {
        let user = self.unlocked_user()?;
        let record = self.db.get_credential(id)?;
        if record.user_id != user.id {
            return Err(PinVaultError::NotFound(format!("credential {}", id)));
        }
        Ok(record)
    }

    /// Decrypt a credential's password with the session secret
    pub fn reveal_password(&self, record: &CredentialRecord) -> Result<String> {
        let secret = self.require_secret()?;
        Ok(self.codec.decrypt(&record.encrypted_password, secret)?)
    }

    /// Decrypt a credential's password, or return `""` if it cannot be
    pub fn reveal_password_or_empty(&self, record: &CredentialRecord) -> String {
        match self.require_secret() {
            Ok(secret) => self.codec.decrypt_or_empty(&record.encrypted_password, secret),
            Err(_) => String::new(),
        }
    }

    /// Credentials grouped by platform, including empty default platforms
    pub fn group_by_platform(&self) -> Result<BTreeMap<String, Vec<CredentialRecord>>> {
        let mut groups: BTreeMap<String, Vec<CredentialRecord>> = DEFAULT_PLATFORMS
            .iter()
            .map(|p| (p.to_string(), Vec::new()))
            .collect();

        for record in self.credentials()? {
            groups.entry(record.platform.clone()).or_default().push(record);
        }
        Ok(groups)
    }

    /// Platform names containing `query`, case-insensitively
    pub fn search_platforms(&self, query: &str) -> Result<Vec<String>> {
        let needle = query.to_lowercase();
        Ok(self
            .group_by_platform()?
            .into_keys()
            .filter(|platform| platform.to_lowercase().contains(&needle))
            .collect())
    }

    /// Credentials stored for exactly `platform`
    pub fn filter_by_platform(&self, platform: &str) -> Result<Vec<CredentialRecord>> {
        Ok(self
            .credentials()?
            .into_iter()
            .filter(|r| r.platform == platform)
            .collect())
    }

    pub fn generate_password(&self, length: usize) -> String {
        self.codec.generate_password(length)
    }
}

fn pin_session_secret(pin: &str) -> SecretText {
    SecretText::new(format!("{}{}", pin, PIN_SESSION_SUFFIX))
}

/// A PIN is exactly six ASCII digits
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PinVaultError::InvalidPin)
    }
}
