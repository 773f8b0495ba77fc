use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use playtime_logging::{LogEvent, Logger};
use playtime_snapshots::{SnapshotKind, SnapshotSink};

use crate::classifier::{classify, LineEvent};
use crate::ledger::Ledger;

/// Result of writing out the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub kind: SnapshotKind,
    pub day: DateTime<Utc>,
    pub players: usize,
    /// `None` when the snapshot could not be written.
    pub path: Option<PathBuf>,
}

/// Owns the ledger for the current UTC day and rolls it over at midnight.
pub struct PlaytimeTracker<S: SnapshotSink> {
    ledger: Ledger,
    current_day: DateTime<Utc>,
    sink: S,
    logger: Arc<Logger>,
}

impl<S: SnapshotSink> PlaytimeTracker<S> {
    /// Start tracking the day containing `started_at`.
    pub fn new(started_at: DateTime<Utc>, sink: S, logger: Arc<Logger>) -> Self {
        Self {
            ledger: Ledger::new(),
            current_day: started_at,
            sink,
            logger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Reference timestamp of the tracked day.
    pub fn current_day(&self) -> DateTime<Utc> {
        self.current_day
    }

    /// Process one line observed at `at`.
    ///
    /// A line from a different calendar day first closes out the tracked day
    /// and starts a new one; the line then counts toward the new day.
    pub fn handle_line(&mut self, line: &str, at: DateTime<Utc>) -> Option<FlushReport> {
        debug!(line, "Got new line");

        let rollover = if at.date_naive() != self.current_day.date_naive() {
            Some(self.roll_over(at))
        } else {
            None
        };

        self.apply_line(line, at);
        rollover
    }

    fn apply_line(&mut self, line: &str, at: DateTime<Utc>) {
        let events = classify(line);
        let Some(first) = events.first() else {
            return;
        };

        if first.player().is_empty() {
            self.logger.log(&LogEvent::MalformedLine {
                line: line.to_string(),
            });
            return;
        }

        for event in events {
            match event {
                LineEvent::Leave(player) => {
                    self.logger.log(&LogEvent::LogoutDetected {
                        player: player.to_string(),
                    });
                    let credited = self.ledger.apply_leave(player, at);
                    debug!(player, credited = %credited, "Logout applied");
                }
                LineEvent::Join(player) => {
                    self.logger.log(&LogEvent::LoginDetected {
                        player: player.to_string(),
                    });
                    self.ledger.apply_join(player, at);
                }
            }
        }
    }

    /// Write out the tracked day and begin the day containing `at`.
    pub fn roll_over(&mut self, at: DateTime<Utc>) -> FlushReport {
        info!(previous = %self.current_day, day = %at, "New day");
        self.logger.log(&LogEvent::NewDay {
            previous_day: self.current_day.format("%Y-%m-%d").to_string(),
            day: at.format("%Y-%m-%d").to_string(),
        });

        let report = self.flush(SnapshotKind::Scheduled);
        self.ledger.clear();
        self.current_day = at;
        report
    }

    /// Close open sessions at the end of the tracked day and persist the ledger.
    ///
    /// Write failures are logged and reported, never propagated.
    pub fn flush(&mut self, kind: SnapshotKind) -> FlushReport {
        let closed = self.ledger.reconcile(self.current_day);
        let snapshot = self.ledger.snapshot(self.current_day);
        let interrupted = kind == SnapshotKind::Interrupt;
        debug!(closed, players = snapshot.play_times.len(), %kind, "Flushing ledger");

        let path = match self.sink.write(&snapshot, kind) {
            Ok(path) => {
                self.logger.log(&LogEvent::SnapshotWritten {
                    path: path.clone(),
                    players: snapshot.play_times.len(),
                    interrupted,
                });
                Some(path)
            }
            Err(e) => {
                error!(error = %e, %kind, "Failed to write playtime snapshot");
                self.logger.log(&LogEvent::SnapshotFailed {
                    error: e.to_string(),
                    interrupted,
                });
                None
            }
        };

        FlushReport {
            kind,
            day: self.current_day,
            players: snapshot.play_times.len(),
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{Duration, TimeZone};
    use playtime_logging::LogFormat;
    use playtime_snapshots::{DaySnapshot, SnapshotError};

    /// Keeps written snapshots in memory.
    #[derive(Clone, Default)]
    struct MemorySink {
        written: Arc<Mutex<Vec<(DaySnapshot, SnapshotKind)>>>,
    }

    impl SnapshotSink for MemorySink {
        fn write(
            &self,
            snapshot: &DaySnapshot,
            kind: SnapshotKind,
        ) -> Result<PathBuf, SnapshotError> {
            self.written.lock().unwrap().push((snapshot.clone(), kind));
            Ok(PathBuf::from(playtime_snapshots::snapshot_file_name(
                snapshot.day,
                kind,
            )))
        }
    }

    struct FailingSink;

    impl SnapshotSink for FailingSink {
        fn write(&self, _: &DaySnapshot, _: SnapshotKind) -> Result<PathBuf, SnapshotError> {
            Err(SnapshotError::Write {
                path: PathBuf::from("/data/timelog/playtime_log-2021-03-24.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn logger() -> Arc<Logger> {
        Arc::new(Logger::new(LogFormat::Compact))
    }

    fn t(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, d, h, m, 0).unwrap()
    }

    const JOIN: &str = "[12:35:00] [Server thread/INFO]: Ralea2 joined the game";
    const LEAVE: &str = "[12:45:00] [Server thread/INFO]: Ralea2 left the game";

    #[test]
    fn test_full_day_cycle() {
        let sink = MemorySink::default();
        let mut tracker = PlaytimeTracker::new(t(24, 8, 0), sink.clone(), logger());

        assert!(tracker.handle_line(JOIN, t(24, 12, 35)).is_none());
        assert!(tracker.handle_line(LEAVE, t(24, 12, 45)).is_none());

        let report = tracker
            .handle_line("[00:00:05] [Server thread/INFO]: Saving chunks", t(25, 0, 0))
            .unwrap();

        assert_eq!(report.kind, SnapshotKind::Scheduled);
        assert_eq!(report.day, t(24, 8, 0));
        assert_eq!(report.players, 1);
        assert_eq!(
            report.path,
            Some(PathBuf::from("playtime_log-2021-03-24.json"))
        );

        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        let record = written[0].0.find("Ralea2").unwrap();
        assert_eq!(record.duration, Duration::minutes(10));
        assert_eq!(record.latest_end, t(24, 12, 45));

        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.current_day(), t(25, 0, 0));
    }

    #[test]
    fn test_rollover_closes_open_session_at_midnight() {
        let sink = MemorySink::default();
        let mut tracker = PlaytimeTracker::new(t(24, 8, 0), sink.clone(), logger());

        tracker.handle_line(JOIN, t(24, 23, 0));
        tracker.handle_line(LEAVE, t(25, 0, 30));

        let written = sink.written.lock().unwrap();
        let record = written[0].0.find("Ralea2").unwrap();
        assert_eq!(
            record.duration,
            Duration::hours(1) - Duration::nanoseconds(1)
        );

        // The leave lands on the new day with an assumed start
        let session = tracker.ledger().get("Ralea2").unwrap();
        assert_eq!(session.latest_start, t(25, 0, 0) + Duration::seconds(1));
        assert_eq!(
            session.duration_on_server,
            Duration::minutes(29) + Duration::seconds(59)
        );
    }

    #[test]
    fn test_rollover_across_year_boundary() {
        let sink = MemorySink::default();
        let start = Utc.with_ymd_and_hms(2021, 3, 24, 10, 0, 0).unwrap();
        let same_yday_next_year = Utc.with_ymd_and_hms(2022, 3, 24, 10, 0, 0).unwrap();
        let mut tracker = PlaytimeTracker::new(start, sink.clone(), logger());

        assert!(tracker.handle_line(JOIN, same_yday_next_year).is_some());
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let mut tracker = PlaytimeTracker::new(t(24, 8, 0), MemorySink::default(), logger());

        tracker.handle_line("joined the game", t(24, 9, 0));
        tracker.handle_line("left the game", t(24, 9, 5));

        assert!(tracker.ledger().is_empty());
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let mut tracker = PlaytimeTracker::new(t(24, 8, 0), MemorySink::default(), logger());

        tracker.handle_line("[09:00:00] [Server thread/INFO]: Done (3.2s)!", t(24, 9, 0));
        tracker.handle_line("", t(24, 9, 1));

        assert!(tracker.ledger().is_empty());
    }

    #[test]
    fn test_forced_flush_keeps_ledger() {
        let sink = MemorySink::default();
        let mut tracker = PlaytimeTracker::new(t(24, 9, 30), sink.clone(), logger());
        tracker.handle_line(JOIN, t(24, 12, 35));

        let report = tracker.flush(SnapshotKind::Interrupt);

        assert_eq!(report.kind, SnapshotKind::Interrupt);
        assert_eq!(
            report.path,
            Some(PathBuf::from(
                "playtime_log-2021-03-24T09:30:00-interrupt.json"
            ))
        );
        let written = sink.written.lock().unwrap();
        let record = written[0].0.find("Ralea2").unwrap();
        assert_eq!(
            record.duration,
            Duration::hours(11) + Duration::minutes(25) - Duration::nanoseconds(1)
        );
        assert_eq!(tracker.ledger().len(), 1);
    }

    #[test]
    fn test_write_failure_still_rolls_over() {
        let mut tracker = PlaytimeTracker::new(t(24, 8, 0), FailingSink, logger());
        tracker.handle_line(JOIN, t(24, 12, 35));

        let report = tracker.handle_line(LEAVE, t(25, 1, 0)).unwrap();

        assert_eq!(report.path, None);
        assert_eq!(report.players, 1);
        assert_eq!(tracker.current_day(), t(25, 1, 0));
        // Only the new day's leave remains
        assert_eq!(tracker.ledger().len(), 1);
        assert_eq!(
            tracker.ledger().get("Ralea2").unwrap().latest_start,
            t(25, 0, 0) + Duration::seconds(1)
        );
    }
}
