use std::fmt;

use crate::error::ExecutorError;
use crate::statement::Session;

use super::prepared::SqlitePreparedStatement;

/// An open `SQLite` connection usable as an executor session.
pub struct SqliteSession {
    conn: Option<rusqlite::Connection>,
}

impl SqliteSession {
    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn: Some(conn) }
    }

    /// Private in-memory database.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Connect`] if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, ExecutorError> {
        rusqlite::Connection::open_in_memory()
            .map(Self::from_connection)
            .map_err(|e| ExecutorError::Connect(e.to_string()))
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSession")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Session for SqliteSession {
    type Statement<'s>
        = SqlitePreparedStatement<'s>
    where
        Self: 's;

    fn prepare<'s>(&'s mut self, query: &str) -> Result<SqlitePreparedStatement<'s>, ExecutorError> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| ExecutorError::Connect("connection is closed".into()))?;
        let stmt = conn
            .prepare(query)
            .map_err(|e| ExecutorError::Prepare(e.to_string()))?;
        Ok(SqlitePreparedStatement::new(stmt))
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| ExecutorError::SqliteError(e)),
            None => Ok(()),
        }
    }
}
