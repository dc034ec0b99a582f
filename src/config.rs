//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/arbor/arbor.toml`
//! 3. Local config: `<dir>/.arbor.toml`
//! 4. Environment variables: `ARBOR_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::domain::{Traversal, DEFAULT_INDENT_WIDTH};

/// Unified configuration for arbor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Default order for `arbor walk`
    pub traversal: Traversal,
    /// Spaces per nesting level in outline files
    pub indent_width: usize,
    /// Prefix walked nodes with their depth
    pub show_depth: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            traversal: Traversal::DepthFirstPreOrder,
            indent_width: DEFAULT_INDENT_WIDTH,
            show_depth: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub traversal: Option<Traversal>,
    pub indent_width: Option<usize>,
    pub show_depth: Option<bool>,
}

/// Get the XDG config directory for arbor.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "arbor").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("arbor.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".arbor.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Read one environment key, `None` when it is not set.
fn env_value<T: DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("ARBOR_{}: {e}", key.to_ascii_uppercase()),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            traversal: overlay.traversal.unwrap_or(self.traversal),
            indent_width: overlay.indent_width.unwrap_or(self.indent_width),
            show_depth: overlay.show_depth.unwrap_or(self.show_depth),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.arbor.toml`
    #[instrument(level = "debug")]
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Load a single file on top of the defaults, ignoring other layers.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply ARBOR_* environment variables as explicit overrides.
    ///
    /// Unset variables are skipped; values that fail to parse are errors.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ARBOR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "traversal")? {
            settings.traversal = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("ARBOR_TRAVERSAL: {e}"),
            })?;
        }
        if let Some(val) = env_value(&config, "indent_width")? {
            settings.indent_width = val;
        }
        if let Some(val) = env_value(&config, "show_depth")? {
            settings.show_depth = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.indent_width == 0 {
            return Err(ApplicationError::Config {
                message: "indent_width must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# arbor configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/arbor/arbor.toml
#   Local:  <dir>/.arbor.toml
#   Env:    ARBOR_* environment variables

# Default order for `arbor walk`: pre-order, post-order, breadth-first
traversal = "pre-order"

# Spaces per nesting level in outline files
indent_width = 2

# Prefix walked nodes with their depth
show_depth = false
"#
        .to_string()
    }
}
