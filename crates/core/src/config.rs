//! Application configuration: `config.toml` under the user config directory,
//! overridable through `GAMELIST_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const APP_DIR: &str = "gamelist";
const CONFIG_FILE: &str = "config.toml";
const PREFERENCES_FILE: &str = "preferences.json";

const DEFAULT_CONFIG: &str = r#"# gamelist configuration
#
# data_dir = "/path/to/games"         # where games.json and screenshots live
# preferences_path = "/path/to/preferences.json"

# Delay before the similar-title lookup runs after typing, in milliseconds.
debounce_ms = 300

# How long notifications stay on screen, in milliseconds.
toast_ms = 3000
"#;

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Directory holding the local game store.
    pub data_dir: PathBuf,
    /// File holding language and theme preferences.
    pub preferences_path: PathBuf,
    /// Debounce for the duplicate lookup.
    pub debounce_ms: u64,
    /// Toast lifetime.
    pub toast_ms: u64,
}

impl AppConfig {
    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path()?)
    }

    /// Load from `path` (missing is fine) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .set_default("data_dir", path_default(default_data_dir()?))?
            .set_default("preferences_path", path_default(config_dir()?.join(PREFERENCES_FILE)))?
            .set_default("debounce_ms", 300_i64)?
            .set_default("toast_ms", 3000_i64)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("GAMELIST"))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }
}

fn path_default(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

/// `<config dir>/gamelist`.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine the user config directory")?;
    Ok(base.join(APP_DIR))
}

/// Location of `config.toml`.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// `<data dir>/gamelist`.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("could not determine the user data directory")?;
    Ok(base.join(APP_DIR))
}

/// Write a commented default config unless one exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write config {}", path.display()))
}
