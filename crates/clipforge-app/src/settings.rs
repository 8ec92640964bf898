//! Locating and loading the engine configuration.

use anyhow::{Context, Result};
use clipforge_core::{ConfigFile, EngineConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `<config dir>/clipforge/config.json`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clipforge").join("config.json"))
}

/// Load the config from `explicit`, else from the default location if a
/// file exists there, else fall back to built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        return load_file(path);
    }
    match default_path() {
        Some(path) if path.exists() => load_file(&path),
        _ => {
            debug!("No config file, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

fn load_file(path: &Path) -> Result<EngineConfig> {
    let file = ConfigFile::load_from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    info!(path = %path.display(), version = file.version, "Loaded config");
    Ok(file.engine)
}
