pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Host-level menu settings loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Start with the error-level reporting convention enabled.
    pub use_error_level: bool,
    /// Tooltip installed on the tray icon at startup, if any.
    pub tray_tooltip: Option<String>,
    /// Include the standard item block in the tray menu at startup.
    pub tray_standard_items: bool,
}

impl HostConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            use_error_level: false,
            tray_tooltip: None,
            tray_standard_items: true,
        }
    }
}
