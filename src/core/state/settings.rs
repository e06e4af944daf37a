use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{UniverseError, UniverseResult};

const APP_DIR_NAME: &str = "module-universe";
const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_LOG_FILTER: &str = "info,module_universe=debug";

/// A platform installation known to the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub dest_dir: PathBuf,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub javadoc: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseSettings {
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            platforms: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

/// `<config dir>/module-universe/settings.json`.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(SETTINGS_FILE)
}

/// Read settings from `path`. A missing file gives the defaults.
pub fn load_settings(path: &Path) -> UniverseResult<UniverseSettings> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(UniverseSettings::default());
        }
        Err(e) => return Err(UniverseError::io(path, e)),
    };
    Ok(serde_json::from_str(&raw)?)
}

pub fn save_settings(path: &Path, settings: &UniverseSettings) -> UniverseResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| UniverseError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).map_err(|e| UniverseError::io(path, e))
}
