use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::duration::{format_duration, nanos};

/// One player's accumulated playtime as written to a snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayTimeRecord {
    pub player_name: String,
    pub latest_start: DateTime<Utc>,
    pub latest_end: DateTime<Utc>,
    #[serde(rename = "readableDurationOnServer")]
    pub readable_duration: String,
    #[serde(rename = "durationOnServer", with = "nanos")]
    pub duration: Duration,
}

impl PlayTimeRecord {
    pub fn new(
        player_name: impl Into<String>,
        latest_start: DateTime<Utc>,
        latest_end: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            latest_start,
            latest_end,
            readable_duration: format_duration(duration),
            duration,
        }
    }
}

/// Immutable projection of a day's ledger at rollover or shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    /// Reference timestamp of the day this snapshot covers.
    pub day: DateTime<Utc>,
    /// An empty day may be stored as `null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub play_times: Vec<PlayTimeRecord>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl DaySnapshot {
    /// Build a snapshot, ordering records by player name so output is stable.
    pub fn new(day: DateTime<Utc>, mut play_times: Vec<PlayTimeRecord>) -> Self {
        play_times.sort_by(|a, b| a.player_name.cmp(&b.player_name));
        Self { day, play_times }
    }

    pub fn total_duration(&self) -> Duration {
        self.play_times
            .iter()
            .fold(Duration::zero(), |acc, r| acc + r.duration)
    }

    pub fn find(&self, player_name: &str) -> Option<&PlayTimeRecord> {
        self.play_times.iter().find(|r| r.player_name == player_name)
    }
}

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Day rollover.
    Scheduled,
    /// Forced by process shutdown.
    Interrupt,
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotKind::Scheduled => write!(f, "scheduled"),
            SnapshotKind::Interrupt => write!(f, "interrupt"),
        }
    }
}

/// Summary for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub file_name: String,
    pub day: DateTime<Utc>,
    pub kind: SnapshotKind,
    pub players: usize,
    #[serde(with = "nanos")]
    pub total_duration: Duration,
    pub readable_total: String,
}

/// Playtime of one player summed across snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerTotal {
    pub player_name: String,
    pub days: usize,
    #[serde(with = "nanos")]
    pub duration: Duration,
    pub readable_duration: String,
}
