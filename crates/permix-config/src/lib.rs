//! TOML configuration for Permix.
//!
//! Reads a schema and initial rules with precedence:
//! explicit path > PERMIX_CONFIG > global (~/.permix/config.toml) > defaults

use permix_core::{Permix, PermixError, Schema, StateJson};
use permix_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings that can be read from a TOML config file.
///
/// ```toml
/// [schema.post]
/// actions = ["create", "edit"]
///
/// [rules.post]
/// create = true
/// edit = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub schema: Schema,
    /// Initial static rules, passed through `setup` when present.
    #[serde(default)]
    pub rules: Option<StateJson>,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct PermixConfig {
    pub schema: Schema,
    pub rules: Option<StateJson>,
    /// The file the settings came from, if any.
    pub source: Option<PathBuf>,
}

impl PermixConfig {
    /// Load configuration, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. `explicit` path (CLI flag)
    /// 2. `PERMIX_CONFIG` environment variable
    /// 3. Global config (`<config_dir>/config.toml`)
    /// 4. Defaults (empty schema, no rules)
    ///
    /// A named file that is missing or malformed is an error. A malformed
    /// global file only warns.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PERMIX_CONFIG").map(PathBuf::from));

        if let Some(path) = named {
            let settings = read_settings_file(&path)?;
            return Ok(Self::from_settings(settings, Some(path)));
        }

        let global = config_dir().join(CONFIG_FILE_NAME);
        if !global.exists() {
            tracing::debug!("No config at {}, using defaults", global.display());
            return Ok(Self::from_settings(SettingsFile::default(), None));
        }
        let settings = read_settings_file(&global).unwrap_or_else(|e| {
            tracing::warn!("{e}");
            SettingsFile::default()
        });
        Ok(Self::from_settings(settings, Some(global)))
    }

    fn from_settings(settings: SettingsFile, source: Option<PathBuf>) -> Self {
        Self {
            schema: settings.schema,
            rules: settings.rules,
            source,
        }
    }

    /// Build a container from the schema, running `setup` with the configured
    /// rules when there are any.
    ///
    /// Rule names are checked against the schema only when one is declared.
    pub fn build(&self) -> Result<Permix, PermixError> {
        let permix = Permix::new(self.schema.clone());
        if let Some(state) = &self.rules {
            if !self.schema.is_empty() {
                self.schema.check_state(state)?;
            }
            permix.setup(permix.parse_serializable_state(state));
        }
        Ok(permix)
    }
}

/// Get the Permix config directory path (~/.permix/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PERMIX_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".permix")
}

/// Read and parse a TOML settings file.
pub fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
