//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Returns the format name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(crate::Error::Validation(format!("unknown log format: {s}"))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directives.
    pub directives: String,
    /// Optional file to append to.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            directives: "warn".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolves logging from settings and the process environment.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    /// Resolves logging from settings and a variable lookup.
    ///
    /// Filter precedence: `FAMGRAPH_LOG`, `RUST_LOG`, `--verbose`, the
    /// configured level, then `warn`. An unknown format falls back to pretty.
    #[must_use]
    pub fn resolve(
        settings: &LoggingSettings,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let directives = get("FAMGRAPH_LOG")
            .or_else(|| get("RUST_LOG"))
            .or_else(|| verbose.then(|| "famgraph=debug,info".to_string()))
            .or_else(|| settings.level.clone())
            .unwrap_or_else(|| "warn".to_string());

        let format = get("FAMGRAPH_LOG_FORMAT")
            .or_else(|| settings.format.clone())
            .and_then(|f| f.parse().ok())
            .unwrap_or_default();

        Self {
            format,
            directives,
            file: settings.file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn settings(level: Option<&str>, format: Option<&str>) -> LoggingSettings {
        LoggingSettings {
            format: format.map(String::from),
            level: level.map(String::from),
            file: None,
        }
    }

    #[test_case(&[], false, None, "warn" ; "default")]
    #[test_case(&[], false, Some("info"), "info" ; "configured level")]
    #[test_case(&[], true, Some("info"), "famgraph=debug,info" ; "verbose beats config")]
    #[test_case(&[("RUST_LOG", "trace")], true, None, "trace" ; "rust log beats verbose")]
    #[test_case(&[("RUST_LOG", "trace"), ("FAMGRAPH_LOG", "error")], false, None, "error" ; "famgraph log wins")]
    fn test_filter_precedence(
        vars: &[(&str, &str)],
        verbose: bool,
        level: Option<&str>,
        expected: &str,
    ) {
        let config = LoggingConfig::resolve(&settings(level, None), verbose, |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        });
        assert_eq!(config.directives, expected);
    }

    #[test]
    fn test_format_resolution() {
        let json = LoggingConfig::resolve(&settings(None, Some("JSON")), false, |_| None);
        assert_eq!(json.format, LogFormat::Json);

        let unknown = LoggingConfig::resolve(&settings(None, Some("xml")), false, |_| None);
        assert_eq!(unknown.format, LogFormat::Pretty);

        let env = LoggingConfig::resolve(&settings(None, Some("pretty")), false, |key| {
            (key == "FAMGRAPH_LOG_FORMAT").then(|| "json".to_string())
        });
        assert_eq!(env.format, LogFormat::Json);
    }
}
