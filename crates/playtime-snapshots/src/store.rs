use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};

use crate::duration::format_duration;
use crate::error::SnapshotError;
use crate::types::{DaySnapshot, PlayerTotal, SnapshotKind, SnapshotSummary};
use crate::writer::parse_file_kind;

/// Load a single snapshot file.
pub fn read_snapshot(path: &Path) -> Result<DaySnapshot, SnapshotError> {
    let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read access to a directory of snapshot files.
pub struct SnapshotStore {
    snapshot_dir: PathBuf,
}

impl SnapshotStore {
    pub fn with_dir(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
        }
    }

    /// List snapshots, newest day first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<SnapshotSummary>, SnapshotError> {
        let mut summaries: Vec<SnapshotSummary> = self
            .load_all()?
            .into_iter()
            .map(|(file_name, kind, snapshot)| {
                let total = snapshot.total_duration();
                SnapshotSummary {
                    file_name,
                    day: snapshot.day,
                    kind,
                    players: snapshot.play_times.len(),
                    total_duration: total,
                    readable_total: format_duration(total),
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.day.cmp(&a.day).then_with(|| a.file_name.cmp(&b.file_name)));
        Ok(summaries)
    }

    /// Get a snapshot by file name.
    pub fn get(&self, file_name: &str) -> Result<DaySnapshot, SnapshotError> {
        read_snapshot(&self.snapshot_dir.join(file_name))
    }

    /// Sum each player's playtime across every snapshot.
    ///
    /// A process restart starts a fresh ledger at the end of the log, so an
    /// interrupt snapshot and a later scheduled one for the same date never
    /// overlap and both count.
    pub fn player_totals(&self) -> Result<Vec<PlayerTotal>, SnapshotError> {
        let snapshots = self.load_all()?;

        let mut totals: BTreeMap<String, (HashSet<NaiveDate>, Duration)> = BTreeMap::new();
        for (_, _, snapshot) in &snapshots {
            let date = snapshot.day.date_naive();
            for record in &snapshot.play_times {
                let entry = totals
                    .entry(record.player_name.clone())
                    .or_insert_with(|| (HashSet::new(), Duration::zero()));
                entry.0.insert(date);
                entry.1 = entry.1 + record.duration;
            }
        }

        let mut result: Vec<PlayerTotal> = totals
            .into_iter()
            .map(|(player_name, (days, duration))| PlayerTotal {
                player_name,
                days: days.len(),
                duration,
                readable_duration: format_duration(duration),
            })
            .collect();
        result.sort_by(|a, b| b.duration.cmp(&a.duration));

        Ok(result)
    }

    fn load_all(&self) -> Result<Vec<(String, SnapshotKind, DaySnapshot)>, SnapshotError> {
        if !self.snapshot_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.snapshot_dir).map_err(|source| SnapshotError::Read {
            path: self.snapshot_dir.clone(),
            source,
        })?;

        let mut loaded = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(kind) = parse_file_kind(file_name) else {
                continue;
            };

            match read_snapshot(&path) {
                Ok(snapshot) => loaded.push((file_name.to_string(), kind, snapshot)),
                Err(e) => {
                    tracing::warn!("Failed to parse snapshot {:?}: {}", path, e);
                }
            }
        }

        Ok(loaded)
    }
}
