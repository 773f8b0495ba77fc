//! Configuration file support for playtime.
//!
//! Loads `playtime.toml` from an explicit path, the working directory, or the
//! user config directory, in that order.

use anyhow::{Context, Result};
use playtime_follow::DEFAULT_POLL_INTERVAL;
use playtime_logging::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "playtime.toml";

pub const DEFAULT_OUTPUT_DIR: &str = "/data/timelog/";
pub const DEFAULT_LOG_PATH: &str = "/data/logs/latest.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings read from `playtime.toml`. Every key is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Directory snapshot files are written to
    pub output_dir: Option<PathBuf>,
    /// Server log file to follow
    pub log_path: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub log_level: Option<String>,
    /// Append every tracker event as JSON to this file
    pub event_log: Option<PathBuf>,
    /// Directory for the daily rolling diagnostics log
    pub diagnostics_dir: Option<PathBuf>,
    /// How often the log file is re-checked without a change notification
    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,
}

impl TrackerConfig {
    /// Load configuration from a file.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: TrackerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Find and load the first config file that exists.
    ///
    /// An explicitly given path must exist.
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path)?
                .with_context(|| format!("Config file not found: {}", path.display()));
        }

        for candidate in Self::candidates(working_dir) {
            if let Some(config) = Self::load(&candidate)? {
                tracing::debug!(path = %candidate.display(), "Loaded config");
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    fn candidates(working_dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![working_dir.join(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("playtime").join(CONFIG_FILE_NAME));
        }
        paths
    }
}

/// Values given on the command line, which win over the config file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub log_level: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub log_path: PathBuf,
    pub log_format: LogFormat,
    pub log_level: String,
    pub event_log: Option<PathBuf>,
    pub diagnostics_dir: Option<PathBuf>,
    pub poll_interval: Duration,
}

impl Settings {
    /// Priority: CLI flag > config file > built-in default
    pub fn resolve(cli: CliOverrides, config: TrackerConfig) -> Self {
        Self {
            output_dir: cli
                .output_dir
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            log_path: cli
                .log_path
                .or(config.log_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            log_format: cli.log_format.or(config.log_format).unwrap_or_default(),
            log_level: cli
                .log_level
                .or(config.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            event_log: config.event_log,
            diagnostics_dir: config.diagnostics_dir,
            poll_interval: config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = TrackerConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
output_dir = "/srv/timelog"
log_path = "/srv/minecraft/logs/latest.log"
log_format = "json"
log_level = "debug"
event_log = "/var/log/playtime/events.jsonl"
diagnostics_dir = "/var/log/playtime"
poll_interval = "2s"
"#,
        )
        .unwrap();

        let config = TrackerConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/timelog")));
        assert_eq!(config.log_format, Some(LogFormat::Json));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.poll_interval, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "minecraft_log = \"/tmp/latest.log\"\n").unwrap();

        assert!(TrackerConfig::load(&path).is_err());
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "log_level = \"warn\"\n").unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "log_level = \"trace\"\n").unwrap();

        let config = TrackerConfig::discover(Some(&explicit), dir.path()).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("trace"));

        let config = TrackerConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_discover_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let result = TrackerConfig::discover(Some(&dir.path().join("nope.toml")), dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = Settings::resolve(CliOverrides::default(), TrackerConfig::default());

        assert_eq!(settings.output_dir, PathBuf::from("/data/timelog/"));
        assert_eq!(settings.log_path, PathBuf::from("/data/logs/latest.log"));
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = TrackerConfig {
            output_dir: Some(PathBuf::from("/from/config")),
            log_path: Some(PathBuf::from("/from/config/latest.log")),
            ..Default::default()
        };
        let cli = CliOverrides {
            output_dir: Some(PathBuf::from("/from/cli")),
            ..Default::default()
        };

        let settings = Settings::resolve(cli, config);
        assert_eq!(settings.output_dir, PathBuf::from("/from/cli"));
        assert_eq!(settings.log_path, PathBuf::from("/from/config/latest.log"));
    }
}
