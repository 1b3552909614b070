pub mod types;

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".kronjob.toml";

/// Get the global config file path (~/.kronjob.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (dir/.kronjob.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration.
///
/// An explicit path must exist and parse. Otherwise the local config in `search_dir`
/// is tried first, then the global config; unreadable discovered files are skipped
/// with a warning and defaults are used when nothing is found.
pub fn load_config(explicit: Option<&Path>, search_dir: &Path) -> Result<types::Config> {
    if let Some(path) = explicit {
        return load_from_file(path);
    }

    let candidates = std::iter::once(local_config_path(search_dir)).chain(global_config_path());
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match load_from_file(&path) {
            Ok(config) => {
                log::debug!("Loaded configuration from {}", path.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring configuration {}: {}", path.display(), e),
        }
    }

    Ok(types::Config::default())
}

/// Load configuration from a TOML file.
pub fn load_from_file(path: &Path) -> Result<types::Config> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_from_str(&content, path)
}

/// Parse configuration from a TOML string; `path` is used for error messages.
pub fn load_from_str(content: &str, path: &Path) -> Result<types::Config> {
    let config = toml::from_str(content).map_err(|e| ConfigError::ParsingFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(config)
}
