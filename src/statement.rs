//! Contract with the transport that owns connections and server-side statements.

use std::ops::{Deref, DerefMut};

use crate::config::ConnectOptions;
use crate::error::ExecutorError;
use crate::types::{BindDescriptor, FetchStatus, OutputColumn};

/// A prepared statement on the server.
///
/// Implementations report failures with the matching [`ExecutorError`] kind
/// (`Bind`, `Exec`, `Fetch`) and the protocol's own message.
pub trait StatementHandle {
    /// Number of columns in the result set, `0` for statements without one.
    fn field_count(&self) -> usize;

    /// Number of placeholders in the statement.
    fn param_count(&self) -> usize;

    /// Attach input values. Must reject a descriptor count that differs from
    /// [`param_count`](Self::param_count).
    ///
    /// # Errors
    /// [`ExecutorError::Bind`] when the descriptors cannot be bound.
    fn bind_params(&mut self, params: &[BindDescriptor]) -> Result<(), ExecutorError>;

    /// Announce the output buffer layout used by later fetches.
    ///
    /// # Errors
    /// [`ExecutorError::Bind`] when the layout does not fit the result set.
    fn bind_outputs(&mut self, outputs: &[OutputColumn]) -> Result<(), ExecutorError>;

    /// # Errors
    /// [`ExecutorError::Exec`] when the server rejects the statement.
    fn execute(&mut self) -> Result<(), ExecutorError>;

    /// Advance one row and write it into `outputs`. A value larger than its buffer
    /// is copied partially, flagged on the column, and reported as
    /// [`FetchStatus::Truncated`].
    ///
    /// # Errors
    /// [`ExecutorError::Fetch`] on a protocol failure.
    fn fetch_next(&mut self, outputs: &mut [OutputColumn]) -> Result<FetchStatus, ExecutorError>;

    /// Write column `index` of the current row into `output` again, typically
    /// after the buffer has been enlarged.
    ///
    /// # Errors
    /// [`ExecutorError::Fetch`] if there is no current row or the column does not exist.
    fn fetch_column(&mut self, index: usize, output: &mut OutputColumn)
    -> Result<(), ExecutorError>;

    /// Rows inserted, updated or deleted by the last execute.
    fn affected_rows(&self) -> u64;

    /// Release the server-side statement. Calling it again is a no-op.
    ///
    /// # Errors
    /// Whatever the transport reports while releasing the statement.
    fn close(&mut self) -> Result<(), ExecutorError>;
}

/// One open connection. Not safe for concurrent use; the
/// [`Executor`](crate::Executor) serialises access to it.
pub trait Session: Send {
    type Statement<'s>: StatementHandle
    where
        Self: 's;

    /// # Errors
    /// [`ExecutorError::Prepare`] when the server rejects the query.
    fn prepare<'s>(&'s mut self, query: &str) -> Result<Self::Statement<'s>, ExecutorError>;

    /// Close the connection. Calling it again is a no-op.
    ///
    /// # Errors
    /// Whatever the transport reports while shutting down.
    fn close(&mut self) -> Result<(), ExecutorError>;
}

/// Opens sessions.
pub trait Connector {
    type Session: Session;

    /// # Errors
    /// [`ExecutorError::Connect`] on network, authentication or setup failure.
    fn connect(&self, options: &ConnectOptions) -> Result<Self::Session, ExecutorError>;
}

/// Closes the wrapped statement when dropped unless [`close`](Self::close) already did.
pub struct StatementGuard<T: StatementHandle> {
    stmt: T,
    closed: bool,
}

impl<T: StatementHandle> StatementGuard<T> {
    pub fn new(stmt: T) -> Self {
        Self {
            stmt,
            closed: false,
        }
    }

    /// Close now and report the outcome.
    ///
    /// # Errors
    /// Propagates the statement's close error.
    pub fn close(mut self) -> Result<(), ExecutorError> {
        self.closed = true;
        self.stmt.close()
    }
}

impl<T: StatementHandle> Deref for StatementGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.stmt
    }
}

impl<T: StatementHandle> DerefMut for StatementGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.stmt
    }
}

impl<T: StatementHandle> Drop for StatementGuard<T> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stmt.close() {
            tracing::warn!(error = %e, "failed to close statement");
        }
    }
}
