use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured progress events of the playtime tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    TailStarted {
        log_path: PathBuf,
        output_dir: PathBuf,
    },
    LoginDetected {
        player: String,
    },
    LogoutDetected {
        player: String,
    },
    /// A join/leave line whose player name could not be extracted
    MalformedLine {
        line: String,
    },
    NewDay {
        previous_day: String,
        day: String,
    },
    SnapshotWritten {
        path: PathBuf,
        players: usize,
        interrupted: bool,
    },
    SnapshotFailed {
        error: String,
        interrupted: bool,
    },
    ShutdownRequested,
    /// A further termination signal while a shutdown is already underway
    ShutdownIgnored,
    SourceError {
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for tracker events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger that also appends every event as JSON to `log_path`
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::TailStarted {
                log_path,
                output_dir,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {} {}",
                    "▶".bright_blue(),
                    "Started tailing:".bold(),
                    log_path.display()
                );
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "Snapshots:".dimmed(),
                    output_dir.display().to_string().dimmed()
                );
            }
            LogEvent::LoginDetected { player } => {
                let _ = writeln!(
                    stderr,
                    "  {} Login detected: {}",
                    "→".bright_green(),
                    player.bold()
                );
            }
            LogEvent::LogoutDetected { player } => {
                let _ = writeln!(
                    stderr,
                    "  {} Logout detected: {}",
                    "←".bright_yellow(),
                    player.bold()
                );
            }
            LogEvent::MalformedLine { line } => {
                let _ = writeln!(
                    stderr,
                    "  {} No player name in line: {}",
                    "⚠".bright_yellow(),
                    line.dimmed()
                );
            }
            LogEvent::NewDay { previous_day, day } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} New day new file: {} {} {}",
                    "┌".bright_blue(),
                    previous_day.bright_blue(),
                    "→".dimmed(),
                    day.bright_blue().bold()
                );
            }
            LogEvent::SnapshotWritten {
                path,
                players,
                interrupted,
            } => {
                let label = if *interrupted { "Interrupt snapshot" } else { "Snapshot" };
                let _ = writeln!(
                    stderr,
                    "  {} {} written: {} ({} {})",
                    "✓".bright_green(),
                    label,
                    path.display(),
                    players,
                    if *players == 1 { "player" } else { "players" }
                );
            }
            LogEvent::SnapshotFailed { error, interrupted } => {
                let label = if *interrupted { "interrupt snapshot" } else { "snapshot" };
                let _ = writeln!(
                    stderr,
                    "  {} Failed to write {}: {}",
                    "✗".bright_red(),
                    label,
                    error.bright_red()
                );
            }
            LogEvent::ShutdownRequested => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Interrupted. Writing current playtimes...",
                    "■".bright_magenta()
                );
            }
            LogEvent::ShutdownIgnored => {
                let _ = writeln!(
                    stderr,
                    "  {}",
                    "Shutdown already in progress, signal ignored".dimmed()
                );
            }
            LogEvent::SourceError { error } => {
                let _ = writeln!(
                    stderr,
                    "  {} Log source: {}",
                    "⚠".bright_yellow(),
                    error.yellow()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::TailStarted { log_path, .. } => {
                format!("[{}] tail:start {}", timestamp, log_path.display())
            }
            LogEvent::LoginDetected { player } => format!("[{}] login:{}", timestamp, player),
            LogEvent::LogoutDetected { player } => format!("[{}] logout:{}", timestamp, player),
            LogEvent::MalformedLine { .. } => format!("[{}] line:malformed", timestamp),
            LogEvent::NewDay { day, .. } => format!("[{}] day:{}", timestamp, day),
            LogEvent::SnapshotWritten {
                path,
                players,
                interrupted,
            } => format!(
                "[{}] snapshot:{} {}p {}",
                timestamp,
                if *interrupted { "interrupt" } else { "day" },
                players,
                path.display()
            ),
            LogEvent::SnapshotFailed { error, .. } => {
                format!("[{}] snapshot:error {}", timestamp, error)
            }
            LogEvent::ShutdownRequested => format!("[{}] shutdown", timestamp),
            LogEvent::ShutdownIgnored => return,
            LogEvent::SourceError { error } => format!("[{}] source:error {}", timestamp, error),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}
