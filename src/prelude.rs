//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::binder::{BindValue, ColumnValue, OutputRow, Params};
pub use crate::config::{ConnectOptions, ExecutorOptions, ExecutorOptionsBuilder};
pub use crate::error::ExecutorError;
pub use crate::executor::Executor;
pub use crate::results::{ExecOnly, Results};
pub use crate::statement::{Connector, Session, StatementHandle};
pub use crate::types::{BindDescriptor, FetchStatus, OutputColumn, WireType};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnector, SqlitePreparedStatement, SqliteSession};
