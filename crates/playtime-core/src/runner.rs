use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use playtime_follow::LineSource;
use playtime_logging::{LogEvent, Logger};
use playtime_snapshots::{SnapshotKind, SnapshotSink};

use crate::error::TrackerError;
use crate::shutdown::ShutdownHandle;
use crate::tracker::{FlushReport, PlaytimeTracker};

/// Pause after a non-fatal source error before reading again.
const SOURCE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How the tracker loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Shutdown was requested; the ledger was flushed as an interrupt snapshot.
    Interrupted { report: FlushReport },
    /// The line source ran dry; the ledger was flushed as an interrupt snapshot.
    SourceClosed { report: FlushReport },
}

impl RunOutcome {
    pub fn report(&self) -> &FlushReport {
        match self {
            RunOutcome::Interrupted { report } | RunOutcome::SourceClosed { report } => report,
        }
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Interrupted { .. } => 1,
            RunOutcome::SourceClosed { .. } => 0,
        }
    }
}

/// Drives a [`PlaytimeTracker`] from a line source until shutdown.
///
/// The runner is the only owner of the ledger. Shutdown is observed in the
/// same loop that applies lines, so a flush never races a line being applied.
pub struct TrackerRunner<S: SnapshotSink> {
    tracker: PlaytimeTracker<S>,
    shutdown: ShutdownHandle,
    logger: Arc<Logger>,
}

impl<S: SnapshotSink> TrackerRunner<S> {
    pub fn new(tracker: PlaytimeTracker<S>, logger: Arc<Logger>) -> Self {
        Self {
            tracker,
            shutdown: ShutdownHandle::new(),
            logger,
        }
    }

    /// Get a handle to request shutdown
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn tracker(&self) -> &PlaytimeTracker<S> {
        &self.tracker
    }

    /// Consume lines until shutdown is requested or the source ends.
    pub async fn run<L>(&mut self, source: &mut L) -> Result<RunOutcome, TrackerError>
    where
        L: LineSource + ?Sized,
    {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.requested() => {
                    info!("Shutdown requested, writing interrupt snapshot");
                    let report = self.tracker.flush(SnapshotKind::Interrupt);
                    return Ok(RunOutcome::Interrupted { report });
                }
                line = source.next_line() => match line {
                    Ok(Some(line)) => {
                        self.tracker.handle_line(&line, Utc::now());
                    }
                    Ok(None) => {
                        info!("Log source closed, writing interrupt snapshot");
                        let report = self.tracker.flush(SnapshotKind::Interrupt);
                        return Ok(RunOutcome::SourceClosed { report });
                    }
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => {
                        warn!(error = %e, "Error reading log source");
                        self.logger.log(&LogEvent::SourceError {
                            error: e.to_string(),
                        });
                        tokio::select! {
                            biased;
                            _ = self.shutdown.requested() => {}
                            _ = tokio::time::sleep(SOURCE_RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }
    }
}
