//! # playtime-follow
//!
//! Streams lines appended to a live log file.
//!
//! ## Key Types
//!
//! - [`LineSource`] - Async line stream consumed by the tracker
//! - [`LogFollower`] - Follows a file on disk, re-reading after truncation or rotation
//! - [`StaticLines`] - In-memory line source

mod error;
mod follower;
mod source;

pub use error::FollowError;
pub use follower::{LogFollower, DEFAULT_POLL_INTERVAL};
pub use source::{LineSource, StaticLines};
