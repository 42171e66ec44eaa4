//! Configuration loading and path resolution
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `FORGE_CONFIG` environment variable
//! 3. `<user config dir>/audioforge/config.toml`
//! 4. Built-in defaults (no file)
//!
//! A missing or unreadable TOML file never terminates the tool: a warning is
//! logged and the compiled defaults are used instead.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "FORGE_CONFIG";

/// Environment variable overriding the output root
pub const OUTPUT_ROOT_ENV_VAR: &str = "FORGE_OUTPUT_ROOT";

/// Output root used when nothing else is configured (relative to cwd)
pub const DEFAULT_OUTPUT_ROOT: &str = "OUTPUT";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Locates the TOML configuration file for an application directory
pub struct ConfigFileResolver {
    app_dir: String,
}

impl ConfigFileResolver {
    /// Create a resolver looking under `<user config dir>/<app_dir>/`
    pub fn new(app_dir: &str) -> Self {
        Self {
            app_dir: app_dir.to_string(),
        }
    }

    /// Resolve the configuration file path
    ///
    /// Returns `None` when no source names a file and the per-user default
    /// does not exist, meaning built-in defaults apply.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            debug!("Config file from command line: {}", path.display());
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                debug!("Config file from {}: {}", CONFIG_ENV_VAR, path);
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config directory
        let user_config = self.user_config_path()?;
        if user_config.exists() {
            debug!("Config file from user config dir: {}", user_config.display());
            Some(user_config)
        } else {
            None
        }
    }

    /// Per-user default configuration path, if the platform has a config dir
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(&self.app_dir).join("config.toml"))
    }
}

/// Load a TOML configuration, falling back to defaults
///
/// - `None` path: defaults
/// - missing file: warning + defaults
/// - unparseable file: `Error::Config` (a broken file is a user mistake worth surfacing)
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write a TOML configuration atomically
///
/// Serializes to a sibling temporary file, then renames it over the target.
pub fn write_toml_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }

    debug!("Wrote configuration to {}", path.display());
    Ok(())
}

/// Resolve the output root
///
/// Priority: command line, `FORGE_OUTPUT_ROOT`, TOML `output_root`, `OUTPUT`.
pub fn resolve_output_root(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(OUTPUT_ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}
