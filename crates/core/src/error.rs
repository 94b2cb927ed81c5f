//! Error types shared by the core and its adapters.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while importing a file or directory.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read failed in {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Failure reported by a [`MessageSink`](crate::ports::MessageSink).
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("unparseable timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("sink connection lock poisoned")]
    LockPoisoned,

    #[error("database error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SinkError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SinkError::Backend(Box::new(err))
    }
}

/// Failure loading or saving credentials.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Format(#[from] serde_json::Error),
}
