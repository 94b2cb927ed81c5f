//! Core of the IRCCloud log importer.
//!
//! ```text
//! import_directory ──► import_file (one task per #channel file) ──► parse_line ──► MessageSink
//! ```
//!
//! The sink and config source are ports; concrete databases and config files
//! live in the adapter crates.

pub mod application;
pub mod domain;
pub mod error;
pub mod parser;
pub mod ports;
pub mod utils;

pub use application::ImportService;
pub use domain::{DbConfig, FileReport, ImportJob, ImportSummary, LogFileKind, ParsedMessage};
pub use error::{ConfigError, ImportError, SinkError};
pub use ports::{ConfigRepository, MessageSink};
