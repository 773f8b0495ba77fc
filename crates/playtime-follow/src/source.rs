use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::FollowError;

/// A stream of raw text lines, in arrival order.
///
/// Implementations must be cancel-safe: dropping a pending `next_line` future
/// must not lose a line.
#[async_trait]
pub trait LineSource: Send {
    /// Wait for the next line. `Ok(None)` means the source is exhausted.
    async fn next_line(&mut self) -> Result<Option<String>, FollowError>;
}

/// Fixed set of lines, mostly useful for replaying a captured log.
#[derive(Debug, Default)]
pub struct StaticLines {
    lines: VecDeque<String>,
}

impl StaticLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LineSource for StaticLines {
    async fn next_line(&mut self) -> Result<Option<String>, FollowError> {
        Ok(self.lines.pop_front())
    }
}
