use std::fs;
use std::path::{Path, PathBuf};

use irclog_core::domain::DbConfig;
use irclog_core::error::ConfigError;
use irclog_core::ports::ConfigRepository;
use tracing::debug;

/// Reads and writes database credentials as a small JSON object:
///
/// ```json
/// {"db":"irclogs","host":"localhost","port":5432,"username":"irc","password":"secret"}
/// ```
pub struct JsonConfigRepository {
    path: PathBuf,
}

impl JsonConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigRepository for JsonConfigRepository {
    fn load(&self) -> Result<DbConfig, ConfigError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let config: DbConfig = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), host = %config.host, "loaded config");
        Ok(config)
    }

    fn save(&self, config: &DbConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string(config)?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }
}
