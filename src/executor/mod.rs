//! The typed executor: one session, serialised behind a mutex.
//!
//! Every call holds the lock from prepare through statement teardown, so two
//! threads sharing an executor never interleave their statements.

mod async_ops;
mod dml;
mod query;

use std::sync::{Mutex, MutexGuard};

use crate::config::{ConnectOptions, ExecutorOptions};
use crate::error::ExecutorError;
use crate::statement::{Connector, Session};

/// Runs typed prepared statements on a single session.
pub struct Executor<S: Session> {
    session: Mutex<Option<S>>,
    options: ExecutorOptions,
}

impl<S: Session> Executor<S> {
    /// Wrap an already open session.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Config`] if `options` are invalid.
    pub fn new(session: S, options: ExecutorOptions) -> Result<Self, ExecutorError> {
        options.validate()?;
        Ok(Self {
            session: Mutex::new(Some(session)),
            options,
        })
    }

    /// Open a session through `connector` and wrap it.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Config`] for invalid options and whatever the
    /// connector reports (normally [`ExecutorError::Connect`]).
    pub fn connect<C>(
        connector: &C,
        connect: &ConnectOptions,
        options: ExecutorOptions,
    ) -> Result<Self, ExecutorError>
    where
        C: Connector<Session = S>,
    {
        options.validate()?;
        let session = connector.connect(connect)?;
        tracing::debug!(host = %connect.host, database = %connect.database, "session opened");
        Self::new(session, options)
    }

    #[must_use]
    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Close the session. Closing twice is a no-op; any later query fails with
    /// [`ExecutorError::Connect`].
    ///
    /// # Errors
    /// Propagates the session's close error. The session is dropped either way.
    pub fn close(&self) -> Result<(), ExecutorError> {
        let session = self.lock().take();
        match session {
            Some(mut session) => {
                tracing::debug!("closing session");
                session.close()
            }
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<S>> {
        // statements never outlive a call, so a panicking holder leaves the session usable
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<S: Session> Drop for Executor<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close session on drop");
        }
    }
}

pub(crate) fn open_session<S>(slot: &mut Option<S>) -> Result<&mut S, ExecutorError> {
    slot.as_mut()
        .ok_or_else(|| ExecutorError::Connect("connection is closed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedConnector, ScriptedSession};

    #[test]
    fn close_is_idempotent() {
        let executor = Executor::new(ScriptedSession::new(), ExecutorOptions::default()).unwrap();
        executor.close().unwrap();
        executor.close().unwrap();
        assert!(executor.is_closed());
        let err = executor.execute("DELETE FROM t", ()).unwrap_err();
        assert!(matches!(err, ExecutorError::Connect(_)));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let opts = ExecutorOptions::builder()
            .initial_column_capacity(10)
            .max_column_bytes(1)
            .finish();
        assert!(matches!(
            Executor::new(ScriptedSession::new(), opts),
            Err(ExecutorError::Config(_))
        ));
    }

    #[test]
    fn connect_failure_surfaces() {
        let connector = ScriptedConnector::refusing("access denied for user 'app'");
        let err = Executor::connect(
            &connector,
            &ConnectOptions::new("db", "app", "pw", "shop", 3306),
            ExecutorOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ExecutorError::Connect(msg) if msg.contains("access denied")));
    }
}
