use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use irclog_core::domain::ParsedMessage;
use irclog_core::error::SinkError;
use irclog_core::ports::MessageSink;
use irclog_core::utils::coerce_timestamp;
use rusqlite::{params, Connection};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS networks (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY,
    network_id INTEGER NOT NULL REFERENCES networks(id),
    channel    TEXT NOT NULL,
    nick       TEXT NOT NULL,
    sent_at    TEXT NOT NULL,
    body       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(network_id, channel, sent_at);
"#;

/// SQLite implementation of the MessageSink trait
///
/// A local stand-in for the PostgreSQL `add_msg` procedure: the network row
/// is created on first use and the message inserted in the same transaction.
/// Concurrent importers are serialized on the connection mutex.
pub struct SqliteMessageSink {
    conn: Mutex<Connection>,
}

impl SqliteMessageSink {
    /// Opens (or creates) the database file and ensures the schema exists
    pub fn open(db_path: &Path) -> Result<Self, SinkError> {
        let conn = Connection::open(db_path).map_err(SinkError::backend)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory().map_err(SinkError::backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(SinkError::backend)?;
        conn.execute_batch(SCHEMA).map_err(SinkError::backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl MessageSink for SqliteMessageSink {
    fn record_message(&self, message: &ParsedMessage) -> Result<(), SinkError> {
        let sent_at = coerce_timestamp(&message.timestamp)
            .ok_or_else(|| SinkError::InvalidTimestamp(message.timestamp.clone()))?;

        let mut conn = self.conn.lock().map_err(|_| SinkError::LockPoisoned)?;
        let tx = conn.transaction().map_err(SinkError::backend)?;

        tx.execute(
            "INSERT OR IGNORE INTO networks (name) VALUES (?1)",
            params![message.network],
        )
        .map_err(SinkError::backend)?;

        let network_id: i64 = tx
            .query_row(
                "SELECT id FROM networks WHERE name = ?1",
                params![message.network],
                |row| row.get(0),
            )
            .map_err(SinkError::backend)?;

        tx.execute(
            "INSERT INTO messages (network_id, channel, nick, sent_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                network_id,
                message.channel,
                message.nick,
                sqlite_datetime(&sent_at),
                message.body,
            ],
        )
        .map_err(SinkError::backend)?;

        tx.commit().map_err(SinkError::backend)?;
        debug!(network_id, channel = %message.channel, "message stored");
        Ok(())
    }
}

// SQLite's own datetime() text layout, so date functions work on the column
fn sqlite_datetime(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn message(network: &str, channel: &str, timestamp: &str, body: &str) -> ParsedMessage {
        ParsedMessage {
            network: network.to_string(),
            channel: channel.to_string(),
            timestamp: timestamp.to_string(),
            nick: "dmh".to_string(),
            body: body.to_string(),
        }
    }

    fn count(sink: &SqliteMessageSink, sql: &str) -> i64 {
        let conn = sink.conn.lock().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_record_message_inserts_row() {
        let sink = SqliteMessageSink::open_in_memory().unwrap();
        sink.record_message(&message("freenode", "#rust", "2016-10-03 21:38:45", "hello world"))
            .unwrap();

        let conn = sink.conn.lock().unwrap();
        let (channel, nick, sent_at, body): (String, String, String, String) = conn
            .query_row(
                "SELECT channel, nick, sent_at, body FROM messages",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(channel, "#rust");
        assert_eq!(nick, "dmh");
        assert_eq!(sent_at, "2016-10-03 21:38:45");
        assert_eq!(body, "hello world");
    }

    #[test]
    fn test_network_row_is_reused() {
        let sink = SqliteMessageSink::open_in_memory().unwrap();
        sink.record_message(&message("freenode", "#a", "2016-10-03 21:38:45", "one"))
            .unwrap();
        sink.record_message(&message("freenode", "#b", "2016-10-03 21:38:46", "two"))
            .unwrap();
        sink.record_message(&message("quakenet", "#a", "2016-10-03 21:38:47", "three"))
            .unwrap();

        assert_eq!(count(&sink, "SELECT COUNT(*) FROM networks"), 2);
        assert_eq!(count(&sink, "SELECT COUNT(*) FROM messages"), 3);
    }

    #[test]
    fn test_unparseable_timestamp_is_rejected() {
        let sink = SqliteMessageSink::open_in_memory().unwrap();
        let err = sink
            .record_message(&message("freenode", "#a", "yesterday-ish", "lost"))
            .unwrap_err();
        assert!(matches!(err, SinkError::InvalidTimestamp(ts) if ts == "yesterday-ish"));
        assert_eq!(count(&sink, "SELECT COUNT(*) FROM messages"), 0);
    }

    #[test]
    fn test_stored_time_is_the_wall_clock_as_written() {
        let sink = SqliteMessageSink::open_in_memory().unwrap();
        for ts in [
            "2016-10-03 21:38:45",
            "2016-10-03T21:38:45+02:00",
            "2016-10-03 21:38:45-04:00",
            "2016/10/03 21:38:45",
        ] {
            sink.record_message(&message("freenode", "#rust", ts, ts)).unwrap();
        }

        let conn = sink.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT DISTINCT sent_at FROM messages").unwrap();
        let stored: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(stored, vec!["2016-10-03 21:38:45".to_string()]);
    }

    #[test]
    fn test_open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");

        {
            let sink = SqliteMessageSink::open(&path).unwrap();
            sink.record_message(&message("freenode", "#a", "2016-10-03 21:38:45", "kept"))
                .unwrap();
        }
        let reopened = SqliteMessageSink::open(&path).unwrap();
        assert_eq!(count(&reopened, "SELECT COUNT(*) FROM messages"), 1);
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        let sink = Arc::new(SqliteMessageSink::open_in_memory().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let channel = format!("#chan{}", t);
                        sink.record_message(&message(
                            "freenode",
                            &channel,
                            "2016-10-03 21:38:45",
                            &format!("msg {}", i),
                        ))
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(count(&sink, "SELECT COUNT(*) FROM messages"), 100);
        assert_eq!(count(&sink, "SELECT COUNT(*) FROM networks"), 1);
    }
}
