use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, ensure, Context};
use clap::Parser;
use irclog_core::ports::{ConfigRepository, MessageSink};
use irclog_core::ImportService;
use json_config_adapter::JsonConfigRepository;
use postgres_adapter::PostgresMessageSink;
use sqlite_adapter::SqliteMessageSink;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Imports IRCCloud channel log exports into the IRC log database
#[derive(Parser, Debug)]
#[command(name = "irclog-import")]
#[command(about = "Imports IRCCloud channel exports into the IRC log database")]
struct Cli {
    /// Directory of exported log files to import
    #[arg(long = "dir")]
    dir: PathBuf,

    /// Name of the network the logs came from, eg 'freenode'
    #[arg(long = "network")]
    network: String,

    /// JSON config file with database credentials, eg ircimport.json
    #[arg(long = "cfg", required_unless_present = "sqlite")]
    cfg: Option<PathBuf>,

    /// Write into a local SQLite database instead of PostgreSQL
    #[arg(long = "sqlite", value_name = "FILE")]
    sqlite: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    check_args(&cli)?;
    let sink = open_sink(&cli).await?;

    let service = ImportService::new(sink, &cli.network);
    let summary = service.import_directory(&cli.dir).await?;

    info!(
        imported = summary.files_imported,
        failed = summary.files_failed,
        skipped = summary.files_skipped,
        lines = summary.lines_scanned,
        messages = summary.messages_parsed,
        rejected = summary.sink_failures,
        "import finished"
    );
    Ok(())
}

// Progress messages go to stdout; RUST_LOG overrides the default level
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn check_args(cli: &Cli) -> anyhow::Result<()> {
    ensure!(!cli.network.trim().is_empty(), "network name is required");
    check_dir(&cli.dir)
}

fn check_dir(dir: &Path) -> anyhow::Result<()> {
    let metadata =
        std::fs::metadata(dir).with_context(|| format!("cannot read {}", dir.display()))?;
    ensure!(metadata.is_dir(), "{} is not a directory", dir.display());
    Ok(())
}

async fn open_sink(cli: &Cli) -> anyhow::Result<Arc<dyn MessageSink>> {
    if let Some(db_path) = &cli.sqlite {
        let sink: Arc<dyn MessageSink> = Arc::new(
            SqliteMessageSink::open(db_path)
                .with_context(|| format!("opening sqlite database {}", db_path.display()))?,
        );
        return Ok(sink);
    }

    let cfg_path = cli
        .cfg
        .as_ref()
        .context("config file is required for database connectivity")?;
    let config = JsonConfigRepository::new(cfg_path)
        .load()
        .with_context(|| format!("loading config {}", cfg_path.display()))?;

    let missing = config.missing_fields();
    if !missing.is_empty() {
        bail!(
            "config {} is missing: {}",
            cfg_path.display(),
            missing.join(", ")
        );
    }

    let sink: Arc<dyn MessageSink> = Arc::new(
        PostgresMessageSink::connect(&config)
            .await
            .with_context(|| format!("connecting to {}:{}", config.host, config.port))?,
    );
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cfg_required_without_sqlite() {
        let err = Cli::try_parse_from(["irclog-import", "--dir", "logs", "--network", "freenode"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_sqlite_replaces_cfg() {
        let cli = Cli::try_parse_from([
            "irclog-import",
            "--dir",
            "logs",
            "--network",
            "freenode",
            "--sqlite",
            "logs.db",
        ])
        .unwrap();
        assert_eq!(cli.sqlite, Some(PathBuf::from("logs.db")));
        assert!(cli.cfg.is_none());
    }

    #[test]
    fn test_blank_network_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            dir: dir.path().to_path_buf(),
            network: "  ".to_string(),
            cfg: None,
            sqlite: None,
        };
        assert!(check_args(&cli).is_err());
    }

    #[test]
    fn test_check_dir_rejects_files_and_missing_paths() {
        let file = std::env::current_exe().unwrap();
        assert!(check_dir(&file).is_err());
        assert!(check_dir(Path::new("/definitely/not/here")).is_err());
        assert!(check_dir(tempfile::tempdir().unwrap().path()).is_ok());
    }

    #[tokio::test]
    async fn test_incomplete_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("ircimport.json");
        JsonConfigRepository::new(&cfg_path)
            .save(&irclog_core::DbConfig {
                host: "localhost".to_string(),
                ..Default::default()
            })
            .unwrap();

        let cli = Cli {
            dir: dir.path().to_path_buf(),
            network: "freenode".to_string(),
            cfg: Some(cfg_path),
            sqlite: None,
        };
        let err = open_sink(&cli).await.err().unwrap();
        assert!(err.to_string().contains("missing: db, port, username"));
    }
}
