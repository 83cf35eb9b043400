use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Prepare error: {0}")]
    Prepare(String),

    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Execution error: {0}")]
    Exec(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Column {column} needs {required} bytes, above the {limit} byte limit")]
    Truncation {
        column: usize,
        required: usize,
        limit: usize,
    },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ExecutorError {
    /// Prefix the message of a [`ExecutorError::Fetch`] with the column it came from.
    #[must_use]
    pub(crate) fn at_column(self, column: usize) -> Self {
        match self {
            ExecutorError::Fetch(msg) => ExecutorError::Fetch(format!("column {column}: {msg}")),
            other => other,
        }
    }
}
