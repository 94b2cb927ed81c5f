use crate::domain::{DbConfig, ParsedMessage};
use crate::error::{ConfigError, SinkError};

/// Destination for parsed messages.
///
/// One handle is shared by every concurrent file import, so implementations
/// must either serialize internally or be safe for simultaneous callers.
pub trait MessageSink: Send + Sync {
    // Looks up the network id and inserts the message as one unit
    fn record_message(&self, message: &ParsedMessage) -> Result<(), SinkError>;
}

/// Trait for loading and storing database credentials
/// This is a port (interface) that defines how the core reaches its config source
pub trait ConfigRepository {
    fn load(&self) -> Result<DbConfig, ConfigError>;
    fn save(&self, config: &DbConfig) -> Result<(), ConfigError>;
}
