//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Name of the SQLite database file inside the root folder
pub const DATABASE_FILE: &str = "crm.db";

/// Optional TOML configuration file contents
///
/// All fields are optional; missing values fall through to environment
/// variables or compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and report artifacts
    pub root_folder: Option<String>,
    /// Anthropic API key fallback (the ANTHROPIC_API_KEY env var wins)
    pub anthropic_api_key: Option<String>,
}

impl TomlConfig {
    /// Load the platform config file if one exists, otherwise defaults
    pub fn load() -> Self {
        match config_file_path() {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(content) => toml::from_str(&content).unwrap_or_default(),
                Err(_) => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (CRM_ROOT_FOLDER)
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("CRM_ROOT_FOLDER") {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve the database path inside the root folder, creating the folder
/// if it does not exist yet
pub fn database_path(root_folder: &PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE))
}

/// Resolve the Anthropic API key: environment variable wins over TOML
pub fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }
    toml_config.anthropic_api_key.clone()
}

/// Get default configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/crm/config.toml first, then /etc/crm/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("crm").join("config.toml"));
        let system_config = PathBuf::from("/etc/crm/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        system_config
    } else {
        dirs::config_dir()
            .map(|d| d.join("crm").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/crm"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/crm"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\crm"))
    } else {
        PathBuf::from("./crm_data")
    }
}
