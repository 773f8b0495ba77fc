//! # playtime-snapshots
//!
//! Persisted daily playtime records.
//!
//! At day rollover, or when the tracker is shut down, the ledger is projected
//! into a [`DaySnapshot`] and written as one JSON document:
//!
//! ```json
//! {
//!   "day": "2021-03-25T09:30:00Z",
//!   "playTimes": [
//!     {
//!       "playerName": "Ralea2",
//!       "latestStart": "2021-03-24T12:35:00Z",
//!       "latestEnd": "2021-03-24T12:45:00Z",
//!       "readableDurationOnServer": "10m0s",
//!       "durationOnServer": 600000000000
//!     }
//!   ]
//! }
//! ```
//!
//! ## Key Types
//!
//! - [`SnapshotSink`] - Where finished snapshots go
//! - [`SnapshotWriter`] - Writes snapshot files into a directory
//! - [`SnapshotStore`] - Reads them back for reporting

pub mod duration;
pub mod error;
pub mod store;
pub mod types;
pub mod writer;

pub use duration::format_duration;
pub use error::SnapshotError;
pub use store::{read_snapshot, SnapshotStore};
pub use types::{DaySnapshot, PlayTimeRecord, PlayerTotal, SnapshotKind, SnapshotSummary};
pub use writer::{parse_file_kind, snapshot_file_name, SnapshotSink, SnapshotWriter};
