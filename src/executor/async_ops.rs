use std::sync::Arc;

use crate::binder::{OutputRow, Params};
use crate::error::ExecutorError;
use crate::results::Results;
use crate::statement::Session;

use super::Executor;

impl<S: Session + 'static> Executor<S> {
    /// [`query_all`](Self::query_all) on tokio's blocking pool.
    ///
    /// # Errors
    /// Same as [`query_all`](Self::query_all), plus [`ExecutorError::Other`] if the
    /// blocking task panics or is cancelled.
    pub async fn query_all_async<Out, In>(
        self: &Arc<Self>,
        query: impl Into<String>,
        params: In,
    ) -> Result<Results<Out>, ExecutorError>
    where
        Out: OutputRow + Send + 'static,
        In: Params + Send + 'static,
    {
        let executor = Arc::clone(self);
        let query = query.into();
        tokio::task::spawn_blocking(move || executor.query_all::<Out, In>(&query, params))
            .await
            .map_err(|e| ExecutorError::Other(format!("blocking query task failed: {e}")))?
    }

    /// [`execute`](Self::execute) on tokio's blocking pool.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute), plus [`ExecutorError::Other`] if the
    /// blocking task panics or is cancelled.
    pub async fn execute_async<In>(
        self: &Arc<Self>,
        query: impl Into<String>,
        params: In,
    ) -> Result<u64, ExecutorError>
    where
        In: Params + Send + 'static,
    {
        let executor = Arc::clone(self);
        let query = query.into();
        tokio::task::spawn_blocking(move || executor.execute(&query, params))
            .await
            .map_err(|e| ExecutorError::Other(format!("blocking execute task failed: {e}")))?
    }
}
