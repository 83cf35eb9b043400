use crate::binder::{OutputRow, ParamBinder, Params, ResultBinder, decode_text_row};
use crate::error::ExecutorError;
use crate::results::Results;
use crate::statement::{Session, StatementGuard, StatementHandle};

use super::{Executor, open_session};

impl<S: Session> Executor<S> {
    /// Run a query and return every row decoded as `Out`.
    ///
    /// ```rust,no_run
    /// use sql_typed_executor::prelude::*;
    ///
    /// # fn demo(executor: &Executor<SqliteSession>) -> Result<(), ExecutorError> {
    /// let results = executor.query_all::<(i32, String), _>("SELECT a, b FROM t WHERE a > ?", (0,))?;
    /// for ((a, b), flags) in results.iter() {
    ///     println!("{a} {b} null={flags:?}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// - [`ExecutorError::Usage`] if the statement's column count differs from `Out`'s arity
    /// - [`ExecutorError::Prepare`], [`ExecutorError::Bind`], [`ExecutorError::Exec`] from the
    ///   corresponding step
    /// - [`ExecutorError::Fetch`] / [`ExecutorError::Truncation`] during the fetch loop; rows
    ///   fetched before the failure are discarded
    pub fn query_all<Out, In>(&self, query: &str, params: In) -> Result<Results<Out>, ExecutorError>
    where
        Out: OutputRow,
        In: Params,
    {
        let mut guard = self.lock();
        let session = open_session(&mut guard)?;
        let stmt = session
            .prepare(query)
            .map_err(|e| prepare_error(query, e))?;
        let mut stmt = StatementGuard::new(stmt);

        let field_count = stmt.field_count();
        if field_count != Out::ARITY {
            return Err(ExecutorError::Usage(format!(
                "query returns {field_count} columns but {} output types were declared",
                Out::ARITY
            )));
        }

        let inputs = ParamBinder::new(&params)?;
        let mut outputs = ResultBinder::for_row::<Out>(&self.options);
        let (rows, null_flags) = run_query(&mut *stmt, &inputs, &mut outputs, Out::decode)?;
        stmt.close()?;
        Ok(Results::from_rows(rows, null_flags))
    }

    /// [`query_all`](Self::query_all) into an existing result object.
    ///
    /// `results` is cleared first. On failure it stays empty, its `error_message`
    /// holds the error text, and the error is returned as well.
    ///
    /// # Errors
    /// Same as [`query_all`](Self::query_all).
    pub fn query_all_into<Out, In>(
        &self,
        results: &mut Results<Out>,
        query: &str,
        params: In,
    ) -> Result<(), ExecutorError>
    where
        Out: OutputRow,
        In: Params,
    {
        results.clear();
        match self.query_all(query, params) {
            Ok(filled) => {
                *results = filled;
                Ok(())
            }
            Err(e) => {
                results.error_message = e.to_string();
                Err(e)
            }
        }
    }

    /// Run a query of any shape and read every column as text. NULL columns read as
    /// an empty string with their flag set.
    ///
    /// # Errors
    /// Same as [`query_all`](Self::query_all), without the arity check.
    pub fn query_all_text<In: Params>(
        &self,
        query: &str,
        params: In,
    ) -> Result<Results<Vec<String>>, ExecutorError> {
        let mut guard = self.lock();
        let session = open_session(&mut guard)?;
        let stmt = session
            .prepare(query)
            .map_err(|e| prepare_error(query, e))?;
        let mut stmt = StatementGuard::new(stmt);

        let inputs = ParamBinder::new(&params)?;
        let mut outputs = ResultBinder::text(stmt.field_count(), &self.options);
        let (rows, null_flags) = run_query(&mut *stmt, &inputs, &mut outputs, decode_text_row)?;
        stmt.close()?;
        Ok(Results::from_rows(rows, null_flags))
    }
}

pub(super) fn prepare_error(query: &str, err: ExecutorError) -> ExecutorError {
    tracing::debug!(query, error = %err, "prepare failed");
    match err {
        ExecutorError::Prepare(_) | ExecutorError::Connect(_) => err,
        other => ExecutorError::Prepare(other.to_string()),
    }
}

pub(super) fn exec_error(err: ExecutorError) -> ExecutorError {
    match err {
        ExecutorError::Exec(_) => err,
        other => ExecutorError::Exec(other.to_string()),
    }
}

fn run_query<T, Out, F>(
    stmt: &mut T,
    inputs: &ParamBinder,
    outputs: &mut ResultBinder,
    decode: F,
) -> Result<(Vec<Out>, Vec<Vec<u8>>), ExecutorError>
where
    T: StatementHandle + ?Sized,
    F: Fn(&[crate::types::OutputColumn]) -> Result<Out, ExecutorError>,
{
    inputs.bind(stmt)?;
    outputs.bind(stmt)?;
    stmt.execute().map_err(exec_error)?;
    outputs.fetch_all(stmt, decode)
}
