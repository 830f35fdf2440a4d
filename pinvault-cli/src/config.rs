//! CLI configuration.

use pinvault_core::{
    get_config_dir, get_default_vault_path, DEFAULT_APP_SALT, DEFAULT_PASSWORD_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub database_path: PathBuf,
    /// Salt mixed into every derived key; changing it orphans stored entries
    pub app_salt: String,
    pub password_length: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_path: get_default_vault_path(),
            app_salt: DEFAULT_APP_SALT.to_string(),
            password_length: DEFAULT_PASSWORD_LENGTH,
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml_dep::from_str(&content)?;
        Ok(config)
    }

    /// Config file looked up when `--config` is not given
    pub fn default_path() -> PathBuf {
        get_config_dir().join("pinvault.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.app_salt, DEFAULT_APP_SALT);
        assert_eq!(config.password_length, 16);
        assert!(config.database_path.ends_with("vault.db"));
    }

    #[test]
    fn test_load_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_salt = \"deployment-salt\"").unwrap();
        writeln!(file, "database_path = \"/tmp/other.db\"").unwrap();

        let config = CliConfig::load(file.path()).unwrap();
        assert_eq!(config.app_salt, "deployment-salt");
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.password_length, 16);
    }
}
