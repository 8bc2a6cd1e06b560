// LogStream - app/snapshot.rs
//
// Bounded, newest-first view of a source file. Reads the whole file (or its
// consumed prefix), so it runs only when a subscriber connects or a lookup is
// requested, never on a poll tick.

use crate::core::model::LogRecord;
use crate::core::parser::{non_blank_lines, parse_line};
use crate::platform::fs;
use std::io;
use std::path::Path;

/// Up to `max_lines` most recent records of the file at `path`, newest first.
///
/// A missing file yields an empty vector. Any other read failure is logged
/// and also yields an empty vector; a snapshot never fails.
pub fn snapshot(path: &Path, max_lines: usize) -> Vec<LogRecord> {
    read_snapshot(path, max_lines, None)
}

/// Same as [`snapshot`], but only the first `consumed` bytes of the file are
/// considered.
///
/// The hub passes a source's published offset here so that lines appended but
/// not yet broadcast are left for the next update event instead of appearing
/// twice.
pub fn snapshot_until(path: &Path, max_lines: usize, consumed: u64) -> Vec<LogRecord> {
    read_snapshot(path, max_lines, Some(consumed))
}

fn read_snapshot(path: &Path, max_lines: usize, consumed: Option<u64>) -> Vec<LogRecord> {
    if max_lines == 0 {
        return Vec::new();
    }

    let read = match consumed {
        Some(limit) => fs::read_prefix_lossy(path, limit),
        None => fs::read_file_lossy(path),
    };

    let content = match read {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Snapshot: read error");
            return Vec::new();
        }
    };

    let records: Vec<LogRecord> = non_blank_lines(&content)
        .rev()
        .take(max_lines)
        .map(parse_line)
        .collect();

    tracing::debug!(
        file = %path.display(),
        records = records.len(),
        max_lines,
        "Snapshot read"
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    fn write_lines(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        stdfs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(snapshot(&dir.path().join("none.log"), 10).is_empty());
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lines(&dir, "a.log", "l1\nl2\n\n  \nl3\nl4\n");

        let records = snapshot(&path, 3);
        let raws: Vec<_> = records.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, vec!["l4", "l3", "l2"]);
    }

    #[test]
    fn test_limit_larger_than_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lines(&dir, "a.log", "l1\nl2");

        let raws: Vec<_> = snapshot(&path, 100).into_iter().map(|r| r.raw).collect();
        assert_eq!(raws, vec!["l2", "l1"]);
    }

    #[test]
    fn test_zero_limit_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lines(&dir, "a.log", "l1\n");
        assert!(snapshot(&path, 0).is_empty());
    }

    #[test]
    fn test_repeated_snapshots_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lines(
            &dir,
            "a.log",
            "2024-01-01T00:00:00 h kern.info k: one\n2024-01-01T00:00:01 h kern.info k: two\n",
        );
        assert_eq!(snapshot(&path, 10), snapshot(&path, 10));
    }

    #[test]
    fn test_snapshot_until_ignores_unconsumed_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lines(&dir, "a.log", "old1\nold2\nnew1\n");

        let raws: Vec<_> = snapshot_until(&path, 10, 10)
            .into_iter()
            .map(|r| r.raw)
            .collect();
        assert_eq!(raws, vec!["old2", "old1"]);
    }
}
