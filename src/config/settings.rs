use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::HostConfig;

const APP_NAME: &str = "ScriptMenu";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the host.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "scriptmenu", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the host configuration.
///
/// If the file doesn't exist, a default one is created. If it cannot be
/// parsed, a warning is logged and the defaults are used instead, so a
/// corrupted config never prevents startup. `path_override` keeps tests away
/// from the real config directory.
pub fn load_config(path_override: Option<&Path>) -> Result<HostConfig> {
    let config_path = match path_override {
        Some(path) => path.to_path_buf(),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = HostConfig::default();
        save_config(&default_config, Some(&config_path))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;
    match serde_json::from_str::<HostConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(HostConfig::default())
        }
    }
}

/// Saves the provided configuration.
pub fn save_config(config: &HostConfig, path_override: Option<&Path>) -> Result<()> {
    let config_path = match path_override {
        Some(path) => path.to_path_buf(),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created config directory: {:?}", parent);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);
    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.scriptmenu.ScriptMenu/
// Linux:   ~/.config/com.scriptmenu.ScriptMenu/
// Windows: %APPDATA%/com.scriptmenu.ScriptMenu/config/
