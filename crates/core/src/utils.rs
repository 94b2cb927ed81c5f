use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;

use crate::domain::LogFileKind;

/// UTF-8 byte order mark that IRCCloud prepends to its exports.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Derives the channel name from a log file path: the base name minus its
/// final extension. The leading `#` is kept.
pub fn channel_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Classifies an export file by its base name.
/// The `-` check runs first, so `-#odd.log` is still a status window.
pub fn classify_file_name(name: &str) -> LogFileKind {
    if name.starts_with('-') {
        LogFileKind::NetworkStatus
    } else if !name.starts_with('#') {
        LogFileKind::NonChannel
    } else {
        LogFileKind::Channel
    }
}

/// Coerces a raw export timestamp into a naive datetime for sinks that can't
/// cast text server-side.
/// Supports "2016-10-03 21:38:45", ISO 8601 with `T`, RFC 3339 and fractional seconds.
///
/// The result is always the wall clock as written. An explicit offset is
/// dropped, the same way PostgreSQL's `::timestamp` cast treats it, and the
/// host's local zone never comes into play.
pub fn coerce_timestamp(timestamp_str: &str) -> Option<NaiveDateTime> {
    let timestamp_str = timestamp_str.trim();
    if timestamp_str.is_empty() {
        return None;
    }

    // IRCCloud's own format
    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S") {
        return Some(naive_dt);
    }

    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive_dt);
    }

    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive_dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str) {
        return Some(dt.naive_local());
    }

    if let Ok(dt) = DateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }

    // Anything dateparser reads without an offset is taken as UTC, so
    // naive_utc() hands back the digits unchanged
    dateparser::parse_with_timezone(timestamp_str, &Utc)
        .ok()
        .map(|dt| dt.naive_utc())
}
