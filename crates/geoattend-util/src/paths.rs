//! Default paths for geoattend components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/geoattend/config.toml` or `~/.config/geoattend/config.toml`
//! - Data: `$XDG_DATA_HOME/geoattend` or `~/.local/share/geoattend`
//! - Logs: `$XDG_STATE_HOME/geoattend` or `~/.local/state/geoattend`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const GEOATTEND_DATA_DIR_ENV: &str = "GEOATTEND_DATA_DIR";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "geoattend";

/// Resolve `$XDG_<kind>` or `~/<fallback>`, then append the app directory.
fn xdg_dir(xdg_var: &str, home_fallback: &[&str], last_resort: &str) -> PathBuf {
    if let Ok(dir) = std::env::var(xdg_var) {
        return PathBuf::from(dir).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        let mut path = PathBuf::from(home);
        for part in home_fallback {
            path.push(part);
        }
        return path.join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(last_resort)
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"], "config").join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$GEOATTEND_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/geoattend` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/geoattend` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(GEOATTEND_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking GEOATTEND_DATA_DIR.
/// Used for config defaults where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"], "data")
}
