//! # playtime-core
//!
//! Turns a stream of server log lines into per-player daily playtime.
//!
//! ## Overview
//!
//! Each line is [classified](classify) as a join, a leave, or neither. Player
//! events update the [`Ledger`], which keeps one [`Session`] per player for
//! the current UTC day. When a line arrives on a new calendar day, or the
//! process is shutting down, open sessions are closed at the end of the
//! tracked day and the ledger is handed to a snapshot sink.
//!
//! ## Key Types
//!
//! - [`PlaytimeTracker`] - Ledger plus day rollover
//! - [`TrackerRunner`] - Single-owner event loop over a line source
//! - [`ShutdownHandle`] - Requests a final interrupt snapshot

mod classifier;
mod error;
mod ledger;
mod runner;
mod shutdown;
mod tracker;

pub use classifier::{classify, player_name, LineEvent, JOIN_PHRASE, LEAVE_PHRASE};
pub use error::TrackerError;
pub use ledger::{assumed_start, end_of_day, start_of_day, Ledger, Session, UNSET};
pub use runner::{RunOutcome, TrackerRunner};
pub use shutdown::ShutdownHandle;
pub use tracker::{FlushReport, PlaytimeTracker};
