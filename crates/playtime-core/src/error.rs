use thiserror::Error;

use playtime_follow::FollowError;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Log source failed: {0}")]
    Source(#[from] FollowError),
}
