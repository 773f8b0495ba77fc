use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::SnapshotError;
use crate::types::{DaySnapshot, SnapshotKind};

pub const FILE_PREFIX: &str = "playtime_log-";
pub const INTERRUPT_SUFFIX: &str = "-interrupt";

/// Destination for finished day snapshots.
pub trait SnapshotSink: Send {
    /// Persist the snapshot and return where it ended up.
    fn write(&self, snapshot: &DaySnapshot, kind: SnapshotKind) -> Result<PathBuf, SnapshotError>;
}

/// File name for a snapshot of `day`.
///
/// Scheduled snapshots are keyed by date (`playtime_log-2021-03-25.json`),
/// interrupt snapshots by second (`playtime_log-2021-03-25T09:30:00-interrupt.json`).
pub fn snapshot_file_name(day: DateTime<Utc>, kind: SnapshotKind) -> String {
    match kind {
        SnapshotKind::Scheduled => format!("{}{}.json", FILE_PREFIX, day.format("%Y-%m-%d")),
        SnapshotKind::Interrupt => format!(
            "{}{}{}.json",
            FILE_PREFIX,
            day.format("%Y-%m-%dT%H:%M:%S"),
            INTERRUPT_SUFFIX
        ),
    }
}

/// Recover the snapshot kind from a file name, `None` if it is not a snapshot file.
pub fn parse_file_kind(file_name: &str) -> Option<SnapshotKind> {
    let stem = file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(".json")?;
    if stem.ends_with(INTERRUPT_SUFFIX) {
        Some(SnapshotKind::Interrupt)
    } else {
        Some(SnapshotKind::Scheduled)
    }
}

/// Writes snapshots as pretty JSON files into an existing directory.
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl SnapshotSink for SnapshotWriter {
    fn write(&self, snapshot: &DaySnapshot, kind: SnapshotKind) -> Result<PathBuf, SnapshotError> {
        let path = self.output_dir.join(snapshot_file_name(snapshot.day, kind));
        let json = serde_json::to_string_pretty(snapshot)?;

        std::fs::write(&path, json).map_err(|source| SnapshotError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), players = snapshot.play_times.len(), "Snapshot written");
        Ok(path)
    }
}
