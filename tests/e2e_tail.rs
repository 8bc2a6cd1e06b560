// LogStream - tests/e2e_tail.rs
//
// End-to-end tests for the tail pipeline.
//
// These tests exercise the real filesystem, real watcher threads and real
// JSON serialisation. Channel connections stand in for the browser
// transport; nothing else is mocked.

use logstream::app::hub::{ChannelConnection, SubscriberHub};
use logstream::app::registry::SourceRegistry;
use logstream::app::snapshot::snapshot;
use logstream::app::tail::{GrowthWatcher, TailManager, Tick};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Helpers
// =============================================================================

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("open for append");
    file.write_all(text.as_bytes()).expect("append");
}

fn next_event(rx: &Receiver<String>) -> Value {
    let text = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("an event should arrive");
    serde_json::from_str(&text).expect("event is valid JSON")
}

fn raws(entries: &Value) -> Vec<String> {
    entries
        .as_array()
        .expect("entries array")
        .iter()
        .map(|e| e["raw"].as_str().unwrap().to_string())
        .collect()
}

struct Fixture {
    _dir: tempfile::TempDir,
    system: PathBuf,
    hub: Arc<SubscriberHub>,
}

impl Fixture {
    fn new(initial: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.log");
        std::fs::write(&system, initial).unwrap();
        let registry = SourceRegistry::new(vec![
            ("system".to_string(), system.clone()),
            ("auth".to_string(), dir.path().join("auth.log")),
        ])
        .unwrap();
        let hub = Arc::new(SubscriberHub::new(Arc::new(registry), 1_000));
        Self {
            _dir: dir,
            system,
            hub,
        }
    }

    fn watcher(&self, name: &str) -> GrowthWatcher {
        GrowthWatcher::new(self.hub.registry().get(name).unwrap().clone())
    }
}

// =============================================================================
// Scenarios
// =============================================================================

/// Structured line in the snapshot, unstructured appended line as an update.
#[test]
fn e2e_snapshot_then_fallback_update() {
    let fx = Fixture::new("2024-01-01T00:00:00 host1 cron.info run[123]: job started\n");
    let mut watcher = fx.watcher("system");

    let (conn, rx) = ChannelConnection::new(16);
    fx.hub.subscribe(conn);

    let initial = next_event(&rx);
    assert_eq!(initial["type"], "initial");
    let system = initial["logs"]["system"].as_array().unwrap();
    assert_eq!(system.len(), 1);
    assert_eq!(system[0]["program"], "run");
    assert_eq!(system[0]["pid"], "123");
    assert_eq!(system[0]["message"], "job started");

    append(&fx.system, "bad line no structure");
    assert!(matches!(
        watcher.tick(&fx.hub).unwrap(),
        Tick::Grew { entries: 1, .. }
    ));

    let update = next_event(&rx);
    assert_eq!(update["type"], "update");
    assert_eq!(update["logType"], "system");
    assert_eq!(update["entries"][0]["severity"], "info");
    assert_eq!(update["entries"][0]["message"], "bad line no structure");
    assert_eq!(update["entries"][0]["hostname"], "unknown");
}

/// Offset advances by exactly the appended bytes and batches follow file order.
#[test]
fn e2e_offset_tracks_appended_bytes() {
    let fx = Fixture::new("seed\n");
    let mut watcher = fx.watcher("system");
    let before = watcher.source().last_known_size();

    let chunk = "L1\nL2\n";
    append(&fx.system, chunk);
    watcher.tick(&fx.hub).unwrap();
    assert_eq!(
        watcher.source().last_known_size(),
        before + chunk.len() as u64
    );

    let (conn, rx) = ChannelConnection::new(16);
    fx.hub.subscribe(conn);
    next_event(&rx);

    append(&fx.system, "L3\n\n \nL4\n");
    watcher.tick(&fx.hub).unwrap();
    assert_eq!(raws(&next_event(&rx)["entries"]), vec!["L3", "L4"]);
}

/// A late subscriber sees current contents once, then only new lines.
#[test]
fn e2e_late_subscriber_gets_no_duplicates() {
    let fx = Fixture::new("");
    let mut watcher = fx.watcher("system");

    let (early, early_rx) = ChannelConnection::new(64);
    fx.hub.subscribe(early);
    next_event(&early_rx);

    for i in 0..3 {
        append(&fx.system, &format!("update {i}\n"));
        watcher.tick(&fx.hub).unwrap();
        next_event(&early_rx);
    }

    // Appended but not yet ticked: must arrive as an update, not in the
    // snapshot as well.
    append(&fx.system, "pending\n");

    let (late, late_rx) = ChannelConnection::new(64);
    fx.hub.subscribe(late);
    let initial = next_event(&late_rx);
    assert_eq!(
        raws(&initial["logs"]["system"]),
        vec!["update 2", "update 1", "update 0"]
    );

    watcher.tick(&fx.hub).unwrap();
    let update = next_event(&late_rx);
    assert_eq!(raws(&update["entries"]), vec!["pending"]);
    assert_eq!(raws(&next_event(&early_rx)["entries"]), vec!["pending"]);
    assert!(late_rx.try_recv().is_err());
}

/// Snapshots are bounded, newest first, and stable.
#[test]
fn e2e_snapshot_bounded_and_stable() {
    let fx = Fixture::new("");
    for i in 0..20 {
        append(
            &fx.system,
            &format!("2024-01-01T00:00:{i:02} host1 user.info app[{i}]: event {i}\n"),
        );
    }

    let first = snapshot(&fx.system, 5);
    assert_eq!(first.len(), 5);
    assert_eq!(first[0].message, "event 19");
    assert_eq!(first[4].message, "event 15");
    assert_eq!(first, snapshot(&fx.system, 5));
}

/// A subscriber that disconnects does not disturb delivery to the others.
#[test]
fn e2e_disconnect_during_stream() {
    let fx = Fixture::new("");
    let mut watcher = fx.watcher("system");

    let (a, rx_a) = ChannelConnection::new(16);
    let (b, rx_b) = ChannelConnection::new(16);
    fx.hub.subscribe(a);
    fx.hub.subscribe(b);
    next_event(&rx_a);
    next_event(&rx_b);

    drop(rx_a);
    append(&fx.system, "after disconnect\n");
    watcher.tick(&fx.hub).unwrap();

    assert_eq!(fx.hub.len(), 1);
    assert_eq!(
        raws(&next_event(&rx_b)["entries"]),
        vec!["after disconnect"]
    );
}

/// Watcher threads deliver every line of every source exactly once.
#[test]
fn e2e_manager_streams_multiple_sources() {
    let fx = Fixture::new("");
    let auth = fx.hub.registry().get("auth").unwrap().path().to_path_buf();

    let (conn, rx) = ChannelConnection::new(256);
    fx.hub.subscribe(conn);
    next_event(&rx);

    let mut manager = TailManager::new();
    manager.start(Arc::clone(&fx.hub), Duration::from_millis(20));

    for i in 0..10 {
        append(&fx.system, &format!("sys {i}\n"));
        append(&auth, &format!("auth {i}\n"));
        std::thread::sleep(Duration::from_millis(7));
    }

    let mut system_lines = Vec::new();
    let mut auth_lines = Vec::new();
    while system_lines.len() < 10 || auth_lines.len() < 10 {
        let update = next_event(&rx);
        let lines = raws(&update["entries"]);
        match update["logType"].as_str().unwrap() {
            "system" => system_lines.extend(lines),
            "auth" => auth_lines.extend(lines),
            other => panic!("unexpected source {other}"),
        }
    }
    manager.stop();

    let expected = |prefix: &str| -> Vec<String> {
        (0..10).map(|i| format!("{prefix} {i}")).collect()
    };
    assert_eq!(system_lines, expected("sys"));
    assert_eq!(auth_lines, expected("auth"));
    assert!(rx.try_recv().is_err(), "no duplicate updates expected");
}

/// Two managers driving the same hub never read a range twice.
#[test]
fn e2e_overlapping_managers_deliver_each_line_once() {
    const LINES: usize = 1_000;
    let fx = Fixture::new("");

    let (conn, rx) = ChannelConnection::new(LINES + 8);
    fx.hub.subscribe(conn);
    next_event(&rx);

    let mut first = TailManager::new();
    let mut second = TailManager::new();
    first.start(Arc::clone(&fx.hub), Duration::from_millis(1));
    second.start(Arc::clone(&fx.hub), Duration::from_millis(1));

    for i in 0..LINES {
        append(&fx.system, &format!("line {i}\n"));
    }

    let mut seen = Vec::new();
    while seen.len() < LINES {
        let update = next_event(&rx);
        assert_eq!(update["logType"], "system");
        seen.extend(raws(&update["entries"]));
    }
    first.stop();
    second.stop();

    let expected: Vec<String> = (0..LINES).map(|i| format!("line {i}")).collect();
    assert_eq!(seen, expected);
    assert!(rx.try_recv().is_err(), "no duplicate updates expected");
}
