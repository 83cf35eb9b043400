use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;

/// Default starting buffer size for variable-length output columns.
pub const DEFAULT_COLUMN_CAPACITY: usize = 256;

/// Default ceiling a variable-length output column may grow to.
pub const DEFAULT_MAX_COLUMN_BYTES: usize = 16 * 1024 * 1024;

/// Options for the typed executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Initial buffer size for string, blob and JSON output columns.
    pub initial_column_capacity: usize,
    /// Largest value a single column may hold; bigger values fail with
    /// [`ExecutorError::Truncation`].
    pub max_column_bytes: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            initial_column_capacity: DEFAULT_COLUMN_CAPACITY,
            max_column_bytes: DEFAULT_MAX_COLUMN_BYTES,
        }
    }
}

impl ExecutorOptions {
    #[must_use]
    pub fn builder() -> ExecutorOptionsBuilder {
        ExecutorOptionsBuilder::new()
    }

    /// Check that the limits are usable.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Config`] if the initial capacity is zero or exceeds
    /// `max_column_bytes`.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        if self.initial_column_capacity == 0 {
            return Err(ExecutorError::Config(
                "initial_column_capacity must be at least 1".into(),
            ));
        }
        if self.max_column_bytes < self.initial_column_capacity {
            return Err(ExecutorError::Config(format!(
                "max_column_bytes ({}) is below initial_column_capacity ({})",
                self.max_column_bytes, self.initial_column_capacity
            )));
        }
        Ok(())
    }
}

/// Fluent builder for [`ExecutorOptions`].
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptionsBuilder {
    opts: ExecutorOptions,
}

impl ExecutorOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn initial_column_capacity(mut self, capacity: usize) -> Self {
        self.opts.initial_column_capacity = capacity;
        self
    }

    #[must_use]
    pub fn max_column_bytes(mut self, limit: usize) -> Self {
        self.opts.max_column_bytes = limit;
        self
    }

    #[must_use]
    pub fn finish(self) -> ExecutorOptions {
        self.opts
    }

    /// Validate and return the options.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Config`] if validation fails.
    pub fn build(self) -> Result<ExecutorOptions, ExecutorError> {
        self.opts.validate()?;
        Ok(self.opts)
    }
}

/// Where and as whom to connect. How each field is used is up to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub host: String,
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub database: String,
    /// `0` lets the transport pick its default port.
    #[serde(default)]
    pub port: u16,
}

impl ConnectOptions {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port,
        }
    }

    /// Options for a transport that only needs a database name or path.
    #[must_use]
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Parse connection options from a JSON document.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Config`] if the document is not valid JSON or is missing fields.
    pub fn from_json(json: &str) -> Result<Self, ExecutorError> {
        serde_json::from_str(json)
            .map_err(|e| ExecutorError::Config(format!("invalid connect options: {e}")))
    }
}
