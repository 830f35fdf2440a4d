mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pinvault_core::{
    CredentialDraft, CredentialRecord, Database, PinVaultError, SecretCodec, SecretText,
    SessionState, VaultSession,
};
use rpassword::prompt_password;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use crate::config::CliConfig;

const UNREADABLE_ENTRY: &str = "could not unlock this entry";

/// PinVault CLI - credentials in a local encrypted vault
#[derive(Parser)]
#[command(name = "pinvault")]
#[command(about = "PIN-protected local password vault", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path override
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Application salt override
    #[arg(long, env = "PINVAULT_APP_SALT", hide_env_values = true)]
    app_salt: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Unlock {
    /// Vault user
    #[arg(short, long)]
    username: String,

    /// Skip the master password and unlock with the PIN only
    #[arg(long)]
    pin_only: bool,
}

#[derive(clap::Args)]
struct EntryFields {
    /// Platform, e.g. GitHub
    #[arg(long)]
    platform: Option<String>,

    /// Label for the account on that platform
    #[arg(long)]
    account_name: Option<String>,

    /// Login name used on the platform
    #[arg(long)]
    login: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Generate the password instead of prompting for it
    #[arg(long)]
    generate: bool,

    /// Length of a generated password
    #[arg(long)]
    length: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and its PIN
    Register {
        #[arg(short, long)]
        username: String,
    },

    /// Replace the PIN of an account
    SetPin {
        #[arg(short, long)]
        username: String,
    },

    /// Add a credential
    Add {
        #[command(flatten)]
        unlock: Unlock,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// List credentials grouped by platform
    List {
        #[command(flatten)]
        unlock: Unlock,

        /// Only platforms whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only this exact platform
        #[arg(long)]
        platform: Option<String>,

        /// Show passwords in plain text
        #[arg(long)]
        show_passwords: bool,
    },

    /// Show one credential including its password
    Show {
        #[command(flatten)]
        unlock: Unlock,

        id: i64,
    },

    /// Change fields of a credential
    Edit {
        #[command(flatten)]
        unlock: Unlock,

        id: i64,

        #[command(flatten)]
        fields: EntryFields,

        /// Prompt for a new password
        #[arg(long)]
        new_password: bool,
    },

    /// Delete a credential
    Remove {
        #[command(flatten)]
        unlock: Unlock,

        id: i64,
    },

    /// Print a random password
    Generate {
        #[arg(long)]
        length: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    if let Commands::Generate { length } = &cli.command {
        let length = length.unwrap_or(cfg.password_length);
        println!("{}", pinvault_core::generate_password(length));
        return Ok(());
    }

    let (db, mut session) = open_vault(&cfg)?;

    match cli.command {
        Commands::Register { username } => {
            let password = prompt_new_secret("Master password: ")?;
            let user = session.register(&username, &password)?;
            let pin = prompt_new_secret("Choose a 6-digit PIN: ")?;
            session.enroll_pin(&pin)?;
            info!(user_id = user.id, "Vault created");
            println!("Registered {} (id {})", user.username, user.id);
        }
        Commands::SetPin { username } => {
            let password = Zeroizing::new(prompt_password("Master password: ")?);
            let (_, has_pin) = session.login(&username, &password)?;
            if has_pin {
                let current = Zeroizing::new(prompt_password("Current PIN: ")?);
                let pin = prompt_new_secret("New 6-digit PIN: ")?;
                let rewritten = session.change_pin(&current, &pin)?;
                println!("PIN updated, {} entries re-encrypted", rewritten);
            } else {
                let pin = prompt_new_secret("New 6-digit PIN: ")?;
                session.enroll_pin(&pin)?;
                println!("PIN set");
            }
        }
        Commands::Add { unlock, fields } => {
            unlock_session(&mut session, &db, &unlock)?;
            let platform = fields
                .platform
                .clone()
                .context("--platform is required when adding")?;
            let password = entry_password(&session, &fields, &cfg, true)?
                .context("a password is required")?;

            let draft = CredentialDraft {
                platform,
                account_name: fields.account_name.unwrap_or_default(),
                username: fields.login.unwrap_or_default(),
                password,
                notes: fields.notes.unwrap_or_default(),
                category: fields.category.unwrap_or_else(|| "Social".to_string()),
            };
            let id = session.save_credential(&draft)?;
            println!("Saved entry {}", id);
        }
        Commands::List {
            unlock,
            search,
            platform,
            show_passwords,
        } => {
            unlock_session(&mut session, &db, &unlock)?;
            let groups = session.group_by_platform()?;
            let wanted = match &search {
                Some(query) => session.search_platforms(query)?,
                None => groups.keys().cloned().collect(),
            };

            for (name, records) in &groups {
                if records.is_empty() || !wanted.contains(name) {
                    continue;
                }
                if platform.as_ref().is_some_and(|p| p != name) {
                    continue;
                }
                println!("{} ({})", name, records.len());
                for record in records {
                    print_record(&session, record, show_passwords);
                }
            }
        }
        Commands::Show { unlock, id } => {
            unlock_session(&mut session, &db, &unlock)?;
            let record = session.credential(id)?;
            print_record(&session, &record, true);
            if !record.notes.is_empty() {
                println!("    notes: {}", record.notes);
            }
        }
        Commands::Edit {
            unlock,
            id,
            fields,
            new_password,
        } => {
            unlock_session(&mut session, &db, &unlock)?;
            let current = session.credential(id)?;

            let password = match entry_password(&session, &fields, &cfg, new_password)? {
                Some(password) => password,
                None => match session.reveal_password(&current) {
                    Ok(password) => SecretText::new(password),
                    Err(PinVaultError::Crypto(_)) => {
                        bail!("{}; pass --new-password to replace it", UNREADABLE_ENTRY)
                    }
                    Err(e) => return Err(e.into()),
                },
            };

            let draft = CredentialDraft {
                platform: fields.platform.unwrap_or(current.platform),
                account_name: fields.account_name.unwrap_or(current.account_name),
                username: fields.login.unwrap_or(current.username),
                password,
                notes: fields.notes.unwrap_or(current.notes),
                category: fields.category.unwrap_or(current.category),
            };
            session.update_credential(id, &draft)?;
            println!("Updated entry {}", id);
        }
        Commands::Remove { unlock, id } => {
            unlock_session(&mut session, &db, &unlock)?;
            session.delete_credential(id)?;
            println!("Removed entry {}", id);
        }
        Commands::Generate { .. } => {}
    }

    session.logout();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<CliConfig> {
    let path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let mut cfg = if path.exists() {
        CliConfig::load(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        CliConfig::default()
    };

    if let Some(database) = &cli.database {
        cfg.database_path = database.clone();
    }
    if let Some(salt) = &cli.app_salt {
        cfg.app_salt = salt.clone();
    }
    Ok(cfg)
}

fn open_vault(cfg: &CliConfig) -> Result<(Database, VaultSession)> {
    if let Some(parent) = cfg.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let db = Database::open(&cfg.database_path)?;
    debug!("Opened vault at {:?}", cfg.database_path);

    let session = VaultSession::new(db.clone(), SecretCodec::new(cfg.app_salt.clone()));
    Ok((db, session))
}

/// Walk the session through login and the PIN step
fn unlock_session(session: &mut VaultSession, db: &Database, unlock: &Unlock) -> Result<()> {
    if unlock.pin_only {
        let (user, has_pin) = db
            .find_user_by_username(&unlock.username)?
            .with_context(|| format!("no vault user named {}", unlock.username))?;
        session.resume(user, has_pin);
    } else {
        let password = Zeroizing::new(prompt_password("Master password: ")?);
        session.login(&unlock.username, &password)?;
    }

    match session.state() {
        SessionState::PinRequired { has_pin: true, .. } => {
            let pin = Zeroizing::new(prompt_password("PIN: ")?);
            session.unlock_with_pin(&pin)?;
        }
        SessionState::PinRequired { has_pin: false, .. } if !unlock.pin_only => {
            let pin = prompt_new_secret("Choose a 6-digit PIN: ")?;
            session.enroll_pin(&pin)?;
        }
        SessionState::PinRequired { has_pin: false, .. } => {
            bail!("{} has no PIN yet; unlock with the master password", unlock.username)
        }
        _ => {}
    }
    Ok(())
}

fn prompt_new_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let first = Zeroizing::new(prompt_password(prompt)?);
    let second = Zeroizing::new(prompt_password("Repeat: ")?);
    if *first != *second {
        bail!("entries did not match");
    }
    Ok(first)
}

/// Password for an entry: generated, prompted, or `None` to keep the old one
fn entry_password(
    session: &VaultSession,
    fields: &EntryFields,
    cfg: &CliConfig,
    prompt: bool,
) -> Result<Option<SecretText>> {
    if fields.generate {
        let length = fields.length.unwrap_or(cfg.password_length);
        return Ok(Some(SecretText::new(session.generate_password(length))));
    }
    if prompt {
        let password = Zeroizing::new(prompt_password("Entry password: ")?);
        return Ok(Some(SecretText::new(password.as_str())));
    }
    Ok(None)
}

fn print_record(session: &VaultSession, record: &CredentialRecord, show_password: bool) {
    let password = if show_password {
        match session.reveal_password(record) {
            Ok(password) => password,
            Err(_) => UNREADABLE_ENTRY.to_string(),
        }
    } else {
        "********".to_string()
    };

    println!(
        "  [{}] {} / {} <{}> {}  {}",
        record.id,
        record.account_name,
        record.username,
        record.category,
        record.created_at.format("%Y-%m-%d"),
        password
    );
}
