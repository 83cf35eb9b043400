use crate::binder::{ParamBinder, Params};
use crate::error::ExecutorError;
use crate::results::{ExecOnly, Results};
use crate::statement::{Session, StatementGuard, StatementHandle};

use super::query::{exec_error, prepare_error};
use super::{Executor, open_session};

impl<S: Session> Executor<S> {
    /// Run a statement for its side effect and return the affected-row count.
    ///
    /// The count is whatever the database reports; for UPDATE that may be rows
    /// matched or rows changed depending on the server.
    ///
    /// # Errors
    /// - [`ExecutorError::Usage`] if the statement produces a result set
    /// - [`ExecutorError::Prepare`], [`ExecutorError::Bind`], [`ExecutorError::Exec`] from the
    ///   corresponding step
    pub fn execute<In: Params>(&self, query: &str, params: In) -> Result<u64, ExecutorError> {
        let mut guard = self.lock();
        let session = open_session(&mut guard)?;
        let stmt = session
            .prepare(query)
            .map_err(|e| prepare_error(query, e))?;
        let mut stmt = StatementGuard::new(stmt);

        let field_count = stmt.field_count();
        if field_count != 0 {
            return Err(ExecutorError::Usage(format!(
                "statement returns {field_count} columns; use query_all"
            )));
        }

        let inputs = ParamBinder::new(&params)?;
        inputs.bind(&mut *stmt)?;
        stmt.execute().map_err(exec_error)?;
        let affected = stmt.affected_rows();
        stmt.close()?;
        tracing::debug!(affected, "statement executed");
        Ok(affected)
    }

    /// [`execute`](Self::execute) into an exec-only result object.
    ///
    /// `results` is cleared first; on failure its `error_message` holds the error
    /// text and the error is returned as well.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute).
    pub fn execute_into<In: Params>(
        &self,
        results: &mut Results<ExecOnly>,
        query: &str,
        params: In,
    ) -> Result<(), ExecutorError> {
        results.clear();
        match self.execute(query, params) {
            Ok(affected) => {
                results.affected_rows = affected;
                Ok(())
            }
            Err(e) => {
                results.error_message = e.to_string();
                Err(e)
            }
        }
    }
}
