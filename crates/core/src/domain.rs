use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::channel_name_from_path;

/// A single authored chat message recovered from an export line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub network: String,
    pub channel: String,
    pub timestamp: String, // raw text, the sink coerces it
    pub nick: String,
    pub body: String,
}

/// One file scheduled for import, with the channel it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
    pub file_path: PathBuf,
    pub channel_name: String,
    pub network: String,
}

impl ImportJob {
    pub fn new(file_path: &Path, network: &str) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            channel_name: channel_name_from_path(file_path),
            network: network.to_string(),
        }
    }
}

/// What an export file holds, judged from its base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFileKind {
    /// `#channel.log`
    Channel,
    /// `-network.log`, the server status window
    NetworkStatus,
    /// Private messages and anything else without a `#` prefix
    NonChannel,
}

/// Outcome of scanning one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub channel: String,
    pub lines_scanned: usize,
    pub messages_parsed: usize,
    pub sink_failures: usize,
}

/// Totals for one directory import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files_scheduled: usize,
    pub files_skipped: usize,
    pub files_imported: usize,
    pub files_failed: usize,
    pub failed_files: Vec<PathBuf>,
    pub lines_scanned: usize,
    pub messages_parsed: usize,
    pub sink_failures: usize,
}

impl ImportSummary {
    pub fn absorb(&mut self, report: &FileReport) {
        self.files_imported += 1;
        self.lines_scanned += report.lines_scanned;
        self.messages_parsed += report.messages_parsed;
        self.sink_failures += report.sink_failures;
    }

    pub fn fail(&mut self, path: PathBuf) {
        self.files_failed += 1;
        self.failed_files.push(path);
    }
}

/// Database credentials as stored in the JSON config file.
///
/// Missing keys decode to empty values; callers check [`DbConfig::missing_fields`]
/// before connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    #[serde(rename = "db")]
    pub db_name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    /// Names of the connection fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.db_name.is_empty() {
            missing.push("db");
        }
        if self.host.is_empty() {
            missing.push("host");
        }
        if self.port == 0 {
            missing.push("port");
        }
        if self.username.is_empty() {
            missing.push("username");
        }
        missing
    }
}
