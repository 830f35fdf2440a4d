//! Where the CLI keeps its vault and config file

use std::path::PathBuf;

const APP_DIR: &str = "PinVault";

/// `<base>/PinVault`, taking the first base directory the platform knows
fn app_dir(bases: &[fn() -> Option<PathBuf>], home_fallback: &str) -> PathBuf {
    bases
        .iter()
        .find_map(|base| base())
        .or_else(|| dirs::home_dir().map(|home| home.join(home_fallback)))
        .unwrap_or_default()
        .join(APP_DIR)
}

/// Directory holding `vault.db`, e.g. `~/.local/share/PinVault` on Linux
pub fn get_data_dir() -> PathBuf {
    app_dir(&[dirs::data_local_dir, dirs::data_dir], ".pinvault")
}

/// Directory searched for `pinvault.toml`
pub fn get_config_dir() -> PathBuf {
    app_dir(&[dirs::config_dir], ".pinvault")
}

pub fn get_default_vault_path() -> PathBuf {
    get_data_dir().join("vault.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_end_in_app_dir() {
        assert!(get_data_dir().ends_with(APP_DIR));
        assert!(get_config_dir().ends_with(APP_DIR));
        assert!(get_default_vault_path().ends_with("PinVault/vault.db"));
    }

    #[test]
    fn test_app_dir_falls_back_past_missing_bases() {
        fn none() -> Option<PathBuf> {
            None
        }
        fn fixed() -> Option<PathBuf> {
            Some(PathBuf::from("/srv/data"))
        }

        assert_eq!(app_dir(&[none, fixed], ".x"), PathBuf::from("/srv/data/PinVault"));
    }
}
