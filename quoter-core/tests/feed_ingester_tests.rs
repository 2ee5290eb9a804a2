//! Feed ingester integration tests
//!
//! Spawns real `sh` processes as the feed, so these only run on unix.

#![cfg(unix)]

use anyhow::Result;
use quoter_core::config::FeedConfig;
use quoter_core::testing::RecordingListener;
use quoter_core::{FeedError, FeedIngester};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn shell_feed(script: &str) -> FeedConfig {
    FeedConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: None,
        pin_thread: false,
        ..FeedConfig::default()
    }
}

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_finite_feed_delivers_latest_price() -> Result<()> {
    let script = r#"printf '{"midprice":1.0841,"ts":1}\n'; sleep 0.1
printf '{"midprice":1.0842,"ts":2}\n{"midprice":1.0843,"ts":3}\n'"#;
    let listener = Arc::new(RecordingListener::new());
    let feed = FeedIngester::start(&shell_feed(script), listener.clone())?;
    assert!(feed.pid() > 0);

    let stats = feed.wait().expect("reader thread joined");
    assert!(stats.lines >= 3);
    assert_eq!(stats.truncated_lines, 0);

    // First read carries exactly the first record
    assert_eq!(listener.connected(), vec![1.0841]);
    // Later records may be coalesced, but the last one always arrives
    let prices = listener.prices();
    assert!(!prices.is_empty() && prices.len() <= 2);
    assert_eq!(prices.last().copied(), Some(1.0843));
    assert_eq!(stats.prices_forwarded as usize, 1 + prices.len());

    assert!(feed.wait().is_none());
    Ok(())
}

#[test]
fn test_malformed_records_are_skipped() -> Result<()> {
    let script = r#"printf 'booting up\n{"midprice":"n/a","ts":0}\n{"midprice":2.5,"ts":1}\n'"#;
    let listener = Arc::new(RecordingListener::new());
    let feed = FeedIngester::start(&shell_feed(script), listener.clone())?;
    feed.wait();

    assert_eq!(listener.connected(), vec![2.5]);
    assert!(listener.prices().is_empty());
    Ok(())
}

#[test]
fn test_stderr_output_does_not_disturb_prices() -> Result<()> {
    let script = r#"echo 'warming up' >&2; printf '{"midprice":3.25,"ts":1}\n'"#;
    let listener = Arc::new(RecordingListener::new());
    let feed = FeedIngester::start(&shell_feed(script), listener.clone())?;
    feed.wait();

    assert_eq!(listener.connected(), vec![3.25]);
    Ok(())
}

#[test]
fn test_stop_terminates_running_feed() -> Result<()> {
    let script = r#"while true; do printf '{"midprice":1.5,"ts":1}\n'; sleep 0.02; done"#;
    let listener = Arc::new(RecordingListener::new());
    let feed = FeedIngester::start(&shell_feed(script), listener.clone())?;

    assert!(wait_until(Duration::from_secs(5), || !listener.connected().is_empty()));
    assert!(feed.is_running());

    feed.stop()?;
    assert!(!feed.is_running());
    let delivered = listener.prices().len();

    thread::sleep(Duration::from_millis(200));
    assert_eq!(listener.prices().len(), delivered);

    // Idempotent
    feed.stop()?;
    Ok(())
}

#[test]
fn test_working_directory_is_applied() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("price.txt"), "{\"midprice\":7.75,\"ts\":1}\n")?;

    let config = FeedConfig {
        working_dir: Some(dir.path().to_path_buf()),
        ..shell_feed("cat price.txt")
    };
    let listener = Arc::new(RecordingListener::new());
    let feed = FeedIngester::start(&config, listener.clone())?;
    feed.wait();

    assert_eq!(listener.connected(), vec![7.75]);
    Ok(())
}

#[test]
fn test_spawn_failure_is_reported() {
    let config = FeedConfig {
        program: "/nonexistent/price-feed".to_string(),
        args: Vec::new(),
        ..FeedConfig::default()
    };
    let listener = Arc::new(RecordingListener::new());

    match FeedIngester::start(&config, listener) {
        Err(FeedError::Spawn { program, .. }) => assert_eq!(program, "/nonexistent/price-feed"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("spawning a missing program succeeded"),
    }
}
