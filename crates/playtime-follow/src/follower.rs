use std::collections::VecDeque;
use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::FollowError;
use crate::source::LineSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Follows a growing log file, surviving truncation and rotation.
///
/// Reading starts at the end of the file as it was when opened. The parent
/// directory is watched for changes and the file is also re-checked every
/// poll interval, since some filesystems never deliver notifications.
pub struct LogFollower {
    path: PathBuf,
    offset: u64,
    identity: Option<u64>,
    partial: Vec<u8>,
    pending: VecDeque<String>,
    poll_interval: Duration,
    notifications: mpsc::UnboundedReceiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl LogFollower {
    /// Open `path` for following. Fails if the file cannot be opened now.
    pub fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self, FollowError> {
        let path = path.into();

        let file = File::open(&path).map_err(|source| FollowError::SourceUnavailable {
            path: path.clone(),
            source,
        })?;
        let metadata = file
            .metadata()
            .map_err(|source| FollowError::SourceUnavailable {
                path: path.clone(),
                source,
            })?;

        let (tx, notifications) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if tx.send(res).is_err() {
                debug!("Log follower notification receiver dropped");
            }
        })?;

        let watch_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            offset: metadata.len(),
            identity: file_identity(&metadata),
            path,
            partial: Vec::new(),
            pending: VecDeque::new(),
            poll_interval,
            notifications,
            _watcher: watcher,
        })
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read every complete line appended since the last call.
    fn read_available(&mut self) -> Result<(), FollowError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            // Rotated away and not recreated yet
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(FollowError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let metadata = file.metadata().map_err(|source| self.read_error(source))?;
        let identity = file_identity(&metadata);

        if identity != self.identity {
            debug!(path = %self.path.display(), "Log file replaced, reading from start");
            self.restart(identity);
        } else if metadata.len() < self.offset {
            debug!(path = %self.path.display(), "Log file truncated, reading from start");
            self.restart(identity);
        }

        if metadata.len() == self.offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.offset))
            .map_err(|source| self.read_error(source))?;
        let mut reader = BufReader::new(file);

        loop {
            let read = reader
                .read_until(b'\n', &mut self.partial)
                .map_err(|source| FollowError::Read {
                    path: self.path.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            self.offset = self.offset.saturating_add(read as u64);

            if self.partial.last() == Some(&b'\n') {
                self.pending.push_back(take_line(&mut self.partial));
            }
        }

        Ok(())
    }

    fn restart(&mut self, identity: Option<u64>) {
        self.identity = identity;
        self.offset = 0;
        self.partial.clear();
    }

    fn read_error(&self, source: std::io::Error) -> FollowError {
        FollowError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if !matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) {
            return false;
        }

        let Some(file_name) = self.path.file_name() else {
            return true;
        };
        event
            .paths
            .iter()
            .any(|p| p.file_name().map(|n| n == file_name).unwrap_or(false))
    }

    /// Block until the watcher reports a change to the file or the poll interval elapses.
    async fn wait_for_change(&mut self) {
        let deadline = tokio::time::sleep(self.poll_interval);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return,
                notification = self.notifications.recv() => match notification {
                    Some(Ok(event)) => {
                        if self.is_relevant(&event) {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Log file watcher error");
                    }
                    // Watcher gone, fall back to polling
                    None => {
                        (&mut deadline).await;
                        return;
                    }
                },
            }
        }
    }
}

#[async_trait]
impl LineSource for LogFollower {
    async fn next_line(&mut self) -> Result<Option<String>, FollowError> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }

            self.read_available()?;
            if !self.pending.is_empty() {
                continue;
            }

            self.wait_for_change().await;
        }
    }
}

fn take_line(buf: &mut Vec<u8>) -> String {
    let mut bytes = std::mem::take(buf);
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(unix)]
fn file_identity(metadata: &Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
fn file_identity(_metadata: &Metadata) -> Option<u64> {
    None
}
