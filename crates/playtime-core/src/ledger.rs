use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::debug;

use playtime_snapshots::{DaySnapshot, PlayTimeRecord};

/// Placeholder for a start or end that has not been observed yet.
/// Earlier than any real event timestamp.
pub const UNSET: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// 00:00:00 UTC of `t`'s calendar day.
pub fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(NaiveTime::default()).and_utc()
}

/// Assumed start for a player who leaves at `t` without a recorded join:
/// 00:00:01 UTC of `t`'s calendar day, or `t` itself if that is earlier.
pub fn assumed_start(t: DateTime<Utc>) -> DateTime<Utc> {
    (start_of_day(t) + Duration::seconds(1)).min(t)
}

/// Last representable instant of `t`'s calendar day, 23:59:59.999999999 UTC.
pub fn end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(t) + Duration::days(1) - Duration::nanoseconds(1)
}

/// One player's state for the current day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub player_name: String,
    /// Most recent join, or [`UNSET`].
    pub latest_start: DateTime<Utc>,
    /// Most recent leave or end-of-day clamp, or [`UNSET`].
    pub latest_end: DateTime<Utc>,
    /// Sum of all completed intervals today. Never decreases.
    pub duration_on_server: Duration,
}

impl Session {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            latest_start: UNSET,
            latest_end: UNSET,
            duration_on_server: Duration::zero(),
        }
    }

    /// A join without a matching leave.
    pub fn is_open(&self) -> bool {
        self.latest_start > self.latest_end
    }

    /// Close the current interval at `end` and fold it into the duration.
    fn close(&mut self, end: DateTime<Utc>) -> Duration {
        self.latest_end = end;
        let elapsed = end - self.latest_start;
        if elapsed < Duration::zero() {
            debug!(player = %self.player_name, "Interval ends before it starts, crediting nothing");
            return Duration::zero();
        }
        self.duration_on_server = self.duration_on_server + elapsed;
        elapsed
    }
}

/// Per-player sessions for the current day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    sessions: HashMap<String, Session>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join. Moves the open interval start without touching the
    /// accumulated duration.
    pub fn apply_join(&mut self, player_name: &str, at: DateTime<Utc>) {
        let session = self
            .sessions
            .entry(player_name.to_string())
            .or_insert_with(|| Session::new(player_name));
        session.latest_start = at;
    }

    /// Record a leave and return the credited time.
    ///
    /// A player with no session yet is assumed online since
    /// [`assumed_start`] of the event's day. Two leaves in a row credit the
    /// same start twice; the log pairs every leave with a join.
    pub fn apply_leave(&mut self, player_name: &str, at: DateTime<Utc>) -> Duration {
        let session = self
            .sessions
            .entry(player_name.to_string())
            .or_insert_with(|| {
                let mut session = Session::new(player_name);
                session.latest_start = assumed_start(at);
                session
            });
        session.close(at)
    }

    /// Close every open session at the end of `reference_day`.
    /// Returns how many sessions were closed.
    pub fn reconcile(&mut self, reference_day: DateTime<Utc>) -> usize {
        let day_end = end_of_day(reference_day);
        let mut closed = 0;

        for session in self.sessions.values_mut().filter(|s| s.is_open()) {
            let credited = session.close(day_end);
            debug!(player = %session.player_name, credited = %credited, "Closed open session at end of day");
            closed += 1;
        }

        closed
    }

    /// Project the ledger into a snapshot for `day`.
    pub fn snapshot(&self, day: DateTime<Utc>) -> DaySnapshot {
        let records = self
            .sessions
            .values()
            .map(|s| {
                PlayTimeRecord::new(
                    s.player_name.clone(),
                    s.latest_start,
                    s.latest_end,
                    s.duration_on_server,
                )
            })
            .collect();
        DaySnapshot::new(day, records)
    }

    pub fn get(&self, player_name: &str) -> Option<&Session> {
        self.sessions.get(player_name)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop all sessions for the start of a new day.
    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
