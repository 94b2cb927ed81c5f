use irclog_core::domain::{DbConfig, ParsedMessage};
use irclog_core::error::SinkError;
use irclog_core::ports::MessageSink;
use tokio::runtime::Handle;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{error, info};

/// Network lookup and insert in a single round trip. The timestamp goes over
/// as text and the server casts it.
pub const ADD_MSG_SQL: &str =
    "select add_msg((select * from get_network_id($1)), $2::text::timestamp, $3, $4, $5);";

/// PostgreSQL implementation of the MessageSink trait
///
/// The client pipelines requests from any number of importer threads over a
/// single connection, so no extra locking is needed here.
pub struct PostgresMessageSink {
    client: Client,
    add_msg: Statement,
    runtime: Handle,
}

impl PostgresMessageSink {
    /// Connects with the given credentials and prepares the insert call.
    ///
    /// Must be called from inside a tokio runtime; the connection task is
    /// spawned onto it.
    pub async fn connect(config: &DbConfig) -> Result<Self, SinkError> {
        let (client, connection) = connection_config(config)
            .connect(NoTls)
            .await
            .map_err(SinkError::backend)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "database connection error");
            }
        });

        let add_msg = client.prepare(ADD_MSG_SQL).await.map_err(SinkError::backend)?;
        info!(host = %config.host, db = %config.db_name, "connected to database");

        Ok(Self {
            client,
            add_msg,
            runtime: Handle::current(),
        })
    }
}

/// Builds the driver config from stored credentials. TLS is off, matching
/// how the log database has always been reached.
pub fn connection_config(config: &DbConfig) -> tokio_postgres::Config {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .dbname(&config.db_name)
        .user(&config.username)
        .ssl_mode(SslMode::Disable);
    if !config.password.is_empty() {
        pg.password(&config.password);
    }
    pg
}

impl MessageSink for PostgresMessageSink {
    // Blocks the calling thread; importers call this from the blocking pool
    fn record_message(&self, message: &ParsedMessage) -> Result<(), SinkError> {
        self.runtime
            .block_on(self.client.execute(
                &self.add_msg,
                &[
                    &message.network,
                    &message.timestamp,
                    &message.nick,
                    &message.channel,
                    &message.body,
                ],
            ))
            .map(|_| ())
            .map_err(SinkError::backend)
    }
}
