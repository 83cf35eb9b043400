use crate::config::ConnectOptions;
use crate::error::ExecutorError;
use crate::statement::Connector;

use super::connection::SqliteSession;

/// Options for opening `SQLite` sessions.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self { wal: true }
    }
}

/// Opens `SQLite` databases. `ConnectOptions::database` is the file path
/// (`:memory:` for a private in-memory database); the other fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnector {
    opts: SqliteOptions,
}

impl SqliteConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the journal to WAL after opening. On by default; a no-op for in-memory databases.
    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }
}

impl Connector for SqliteConnector {
    type Session = SqliteSession;

    fn connect(&self, options: &ConnectOptions) -> Result<SqliteSession, ExecutorError> {
        if options.database.is_empty() {
            return Err(ExecutorError::Connect(
                "SQLite needs a database path (or :memory:)".into(),
            ));
        }
        let conn = rusqlite::Connection::open(&options.database).map_err(|e| {
            ExecutorError::Connect(format!("failed to open {}: {e}", options.database))
        })?;
        if self.opts.wal {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(|e| ExecutorError::Connect(format!("failed to enable WAL: {e}")))?;
            tracing::debug!(database = %options.database, journal_mode = %mode, "sqlite opened");
        }
        Ok(SqliteSession::from_connection(conn))
    }
}
