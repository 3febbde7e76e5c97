//! Settings file loading and path resolution

use crate::settings::MixingSettings;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a settings file
pub const SETTINGS_ENV_VAR: &str = "PODMIX_SETTINGS";

/// Settings path resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. User config directory (`<config_dir>/podmix/settings.toml`), if present
///
/// Returns `None` when nothing is configured; callers then use built-in defaults.
pub fn resolve_settings_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    dirs::config_dir()
        .map(|d| d.join("podmix").join("settings.toml"))
        .filter(|p| p.exists())
}

/// Load settings from a TOML file
///
/// The file is required to exist: an explicitly named file that cannot be
/// read is a configuration error, not a silent fallback to defaults.
pub fn load_settings(path: &Path) -> Result<MixingSettings> {
    debug!("Loading settings from {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read settings {}: {}", path.display(), e))
    })?;

    let settings = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        MixingSettings::from_json(&text)?
    } else {
        MixingSettings::from_toml(&text)?
    };

    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Resolve and load settings, falling back to built-in defaults when no
/// settings file is configured anywhere.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<MixingSettings> {
    match resolve_settings_path(cli_arg, SETTINGS_ENV_VAR) {
        Some(path) => load_settings(&path),
        None => {
            debug!("No settings file configured, using built-in defaults");
            Ok(MixingSettings::default())
        }
    }
}
