use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use playtime_follow::{FollowError, LineSource, LogFollower, StaticLines};
use tempfile::TempDir;

const POLL: Duration = Duration::from_millis(50);

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
}

async fn next(follower: &mut LogFollower) -> String {
    tokio::time::timeout(Duration::from_secs(5), follower.next_line())
        .await
        .expect("timed out waiting for line")
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_open_missing_file_is_source_unavailable() {
    let dir = TempDir::new().unwrap();
    let result = LogFollower::open(dir.path().join("latest.log"), POLL);

    match result {
        Err(e @ FollowError::SourceUnavailable { .. }) => assert!(e.is_fatal()),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("expected open to fail"),
    }
}

#[tokio::test]
async fn test_skips_existing_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latest.log");
    fs::write(&path, "[13:00:00] [Server thread/INFO]: old line\n").unwrap();

    let mut follower = LogFollower::open(&path, POLL).unwrap();
    append(&path, "[13:13:26] [Server thread/INFO]: Ralea2 joined the game\n");

    assert_eq!(
        next(&mut follower).await,
        "[13:13:26] [Server thread/INFO]: Ralea2 joined the game"
    );
}

#[tokio::test]
async fn test_lines_arrive_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latest.log");
    fs::write(&path, "").unwrap();

    let mut follower = LogFollower::open(&path, POLL).unwrap();
    append(&path, "first\nsecond\r\nthird\n");

    assert_eq!(next(&mut follower).await, "first");
    assert_eq!(next(&mut follower).await, "second");
    assert_eq!(next(&mut follower).await, "third");
    assert_eq!(follower.offset(), 20);
}

#[tokio::test]
async fn test_partial_line_waits_for_newline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latest.log");
    fs::write(&path, "").unwrap();

    let mut follower = LogFollower::open(&path, POLL).unwrap();
    append(&path, "adidfr left");

    let early = tokio::time::timeout(Duration::from_millis(200), follower.next_line()).await;
    assert!(early.is_err(), "partial line must not be yielded");

    append(&path, " the game\n");
    assert_eq!(next(&mut follower).await, "adidfr left the game");
}

#[tokio::test]
async fn test_truncation_restarts_from_beginning() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latest.log");
    fs::write(&path, "").unwrap();

    let mut follower = LogFollower::open(&path, POLL).unwrap();
    append(&path, "a fairly long line before truncation\n");
    assert_eq!(next(&mut follower).await, "a fairly long line before truncation");

    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(&path)
        .unwrap();
    append(&path, "short\n");

    assert_eq!(next(&mut follower).await, "short");
}

#[cfg(unix)]
#[tokio::test]
async fn test_rotation_follows_new_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latest.log");
    fs::write(&path, "").unwrap();

    let mut follower = LogFollower::open(&path, POLL).unwrap();
    append(&path, "before rotation\n");
    assert_eq!(next(&mut follower).await, "before rotation");

    fs::rename(&path, dir.path().join("2021-03-24-1.log")).unwrap();
    fs::write(&path, "after rotation with a longer first line\n").unwrap();

    assert_eq!(
        next(&mut follower).await,
        "after rotation with a longer first line"
    );
}

#[tokio::test]
async fn test_static_lines_drain_then_end() {
    let mut source = StaticLines::new(["one", "two"]);

    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("one"));
    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("two"));
    assert_eq!(source.next_line().await.unwrap(), None);
}
