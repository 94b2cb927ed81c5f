use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::domain::{FileReport, ImportJob, ImportSummary, LogFileKind};
use crate::error::ImportError;
use crate::parser::parse_line;
use crate::ports::MessageSink;
use crate::utils::{classify_file_name, UTF8_BOM};

/// Application service that imports IRCCloud exports into a message sink.
///
/// Cloning is cheap: every clone shares the same sink handle, so one clone is
/// moved into each concurrent file import.
#[derive(Clone)]
pub struct ImportService {
    sink: Arc<dyn MessageSink>,
    network: Arc<str>,
}

impl ImportService {
    /// Creates a new ImportService feeding `sink` under the given network name
    pub fn new(sink: Arc<dyn MessageSink>, network: &str) -> Self {
        Self {
            sink,
            network: Arc::from(network),
        }
    }

    /// Imports a single channel log and reports how many lines were scanned.
    ///
    /// Sink failures are logged and skipped; only open and read failures
    /// abort the file.
    pub fn import_file(&self, path: &Path) -> Result<FileReport, ImportError> {
        let job = ImportJob::new(path, &self.network);
        let file_name = display_name(&job.file_path);
        info!(file = %file_name, "importing file");

        let file = File::open(&job.file_path).map_err(|source| ImportError::Open {
            path: job.file_path.clone(),
            source,
        })?;

        let report = self
            .scan(&job.network, &job.channel_name, BufReader::new(file))
            .map_err(|source| ImportError::Read {
                path: job.file_path.clone(),
                source,
            })?;

        info!(
            file = %file_name,
            lines = report.lines_scanned,
            messages = report.messages_parsed,
            "done importing file"
        );
        Ok(report)
    }

    /// Scans an already opened export for `channel`, skipping a leading BOM.
    pub fn import_reader<R: BufRead>(&self, channel: &str, reader: R) -> std::io::Result<FileReport> {
        self.scan(&self.network, channel, reader)
    }

    fn scan<R: BufRead>(
        &self,
        network: &str,
        channel: &str,
        mut reader: R,
    ) -> std::io::Result<FileReport> {
        skip_bom(&mut reader)?;

        let mut report = FileReport {
            channel: channel.to_string(),
            ..FileReport::default()
        };

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            report.lines_scanned += 1;

            let line = String::from_utf8_lossy(trim_line_ending(&buf));
            let Some(message) = parse_line(network, channel, &line) else {
                continue;
            };
            report.messages_parsed += 1;

            if let Err(e) = self.sink.record_message(&message) {
                report.sink_failures += 1;
                warn!(
                    channel = %channel,
                    timestamp = %message.timestamp,
                    nick = %message.nick,
                    error = %e,
                    "failed to record message"
                );
            }
        }

        Ok(report)
    }

    /// Imports every channel log under `dir`, one blocking task per file, and
    /// resolves once all of them have finished.
    ///
    /// Network status windows (`-*`) and non-channel logs are skipped. A file
    /// that fails to import is logged and counted without disturbing the rest.
    pub async fn import_directory(&self, dir: &Path) -> Result<ImportSummary, ImportError> {
        let metadata = std::fs::metadata(dir).map_err(|source| ImportError::Open {
            path: dir.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ImportError::NotADirectory(dir.to_path_buf()));
        }

        let mut summary = ImportSummary::default();
        let mut tasks = JoinSet::new();
        let mut task_files: HashMap<Id, PathBuf> = HashMap::new();

        for path in collect_files(dir) {
            let file_name = display_name(&path);
            match classify_file_name(&file_name) {
                LogFileKind::NetworkStatus => {
                    info!(file = %file_name, "skipping network status window log");
                    summary.files_skipped += 1;
                    continue;
                }
                LogFileKind::NonChannel => {
                    info!(file = %file_name, "skipping non-channel log file");
                    summary.files_skipped += 1;
                    continue;
                }
                LogFileKind::Channel => {}
            }

            let service = self.clone();
            summary.files_scheduled += 1;
            let task_path = path.clone();
            let handle = tasks.spawn_blocking(move || service.import_file(&task_path));
            task_files.insert(handle.id(), path);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(report))) => {
                    task_files.remove(&id);
                    summary.absorb(&report);
                }
                Ok((id, Err(e))) => {
                    let path = task_files.remove(&id).unwrap_or_default();
                    error!(file = %path.display(), error = %e, "file import failed");
                    summary.fail(path);
                }
                Err(e) => {
                    let path = task_files.remove(&e.id()).unwrap_or_default();
                    error!(file = %path.display(), error = %e, "file import task did not complete");
                    summary.fail(path);
                }
            }
        }

        Ok(summary)
    }
}

/// Lists every regular file below `dir`, descending into subdirectories.
/// Entries that can't be read are logged and left out.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn skip_bom<R: BufRead>(reader: &mut R) -> std::io::Result<()> {
    let head = reader.fill_buf()?;
    if head.starts_with(&UTF8_BOM) {
        debug!("skipping UTF-8 byte order mark");
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
