//! Typed prepared-statement execution.
//!
//! Input tuples are turned into parameter bind descriptors, the statement is
//! executed, and every result row is decoded into a typed tuple alongside a
//! per-column NULL-flag vector.
//!
//! ```rust,no_run
//! use sql_typed_executor::prelude::*;
//!
//! # fn main() -> Result<(), ExecutorError> {
//! let executor = Executor::connect(
//!     &SqliteConnector::new(),
//!     &ConnectOptions::for_database(":memory:"),
//!     ExecutorOptions::default(),
//! )?;
//! executor.execute("CREATE TABLE t (a INTEGER, b TEXT)", ())?;
//! let inserted = executor.execute("INSERT INTO t (a, b) VALUES (?, ?)", (5, "x"))?;
//! assert_eq!(inserted, 1);
//!
//! let results = executor.query_all::<(i32, String), _>("SELECT a, b FROM t", ())?;
//! assert_eq!(results.rows, vec![(5, "x".to_string())]);
//! assert_eq!(results.null_flags, vec![vec![0, 0]]);
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConnectOptions, ExecutorOptions, ExecutorOptionsBuilder};
pub use error::ExecutorError;
pub use executor::Executor;
pub use results::{ExecOnly, Results};
