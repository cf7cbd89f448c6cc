//! Configuration management.
//!
//! Configuration comes from a TOML file, then environment overrides:
//!
//! ```toml
//! data_dir = "/var/lib/famgraph"
//!
//! [layout]
//! row_height = 150.0
//! sibling_spacing = 180.0
//!
//! [viewport]
//! max_scale = 4.0
//!
//! [logging]
//! format = "json"
//! level = "famgraph=debug"
//! file = "/var/log/famgraph.log"
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `FAMGRAPH_DATA_DIR` | `data_dir` |
//! | `FAMGRAPH_LOG` | `logging.level` |
//! | `FAMGRAPH_LOG_FORMAT` | `logging.format` |

use crate::rendering::ViewportConfig;
use crate::services::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for famgraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamgraphConfig {
    /// Directory holding persisted trees.
    pub data_dir: PathBuf,
    /// Layout spacing constants.
    pub layout: LayoutConfig,
    /// Viewport limits.
    pub viewport: ViewportConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Filter directives, e.g. `famgraph=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Append logs to this file instead of stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Layout section.
    pub layout: Option<LayoutConfig>,
    /// Viewport section.
    pub viewport: Option<ViewportConfig>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl Default for FamgraphConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "famgraph")
        .map_or_else(|| PathBuf::from(".famgraph"), |dirs| dirs.data_dir().to_path_buf())
}

impl FamgraphConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::parse(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn parse(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/famgraph/` on macOS)
    /// 2. XDG config dir (`~/.config/famgraph/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        Self::default_paths()
            .into_iter()
            .filter(|path| path.exists())
            .find_map(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                    None
                },
            })
            .unwrap_or_default()
    }

    /// Returns the config file locations searched by [`Self::load_default`].
    #[must_use]
    pub fn default_paths() -> Vec<PathBuf> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Vec::new();
        };
        vec![
            base_dirs.config_dir().join("famgraph").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("famgraph")
                .join("config.toml"),
        ]
    }

    /// Converts a `ConfigFile` to `FamgraphConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(layout) = file.layout {
            config.layout = layout;
        }
        if let Some(viewport) = file.viewport {
            config.viewport = viewport;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Applies `FAMGRAPH_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("FAMGRAPH_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = get("FAMGRAPH_LOG") {
            self.logging.level = Some(level);
        }
        if let Some(format) = get("FAMGRAPH_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Renders the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::OperationFailed {
            operation: "serialize_config".to_string(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = FamgraphConfig::parse(
            r#"
            data_dir = "/tmp/trees"

            [layout]
            row_height = 200.0

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/trees"));
        assert!((config.layout.row_height - 200.0).abs() < f64::EPSILON);
        assert!((config.layout.sibling_spacing - 180.0).abs() < f64::EPSILON);
        assert_eq!(config.viewport, ViewportConfig::default());
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = FamgraphConfig::parse("colour = \"blue\"").unwrap_err();
        assert!(err.to_string().contains("parse_config_file"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[viewport]\nmax_scale = 3.0\n").unwrap();

        let config = FamgraphConfig::load_from_file(&path).unwrap();
        assert!((config.viewport.max_scale - 3.0).abs() < f64::EPSILON);

        assert!(FamgraphConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FAMGRAPH_DATA_DIR", "/data"),
            ("FAMGRAPH_LOG", "famgraph=trace"),
            ("FAMGRAPH_LOG_FORMAT", " "),
        ]
        .into_iter()
        .collect();

        let config = FamgraphConfig::new()
            .with_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.logging.level.as_deref(), Some("famgraph=trace"));
        assert!(config.logging.format.is_none());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = FamgraphConfig::new().with_data_dir("/srv/famgraph");
        let text = config.to_toml().unwrap();
        assert_eq!(FamgraphConfig::parse(&text).unwrap(), config);
    }
}
