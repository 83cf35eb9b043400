use std::collections::VecDeque;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::error::ExecutorError;
use crate::statement::StatementHandle;
use crate::types::{BindDescriptor, FetchStatus, OutputColumn};

use super::params::Params;
use super::query::{fill_column, sqlite_extract_value_sync};

/// A prepared `SQLite` statement speaking the bind/execute/fetch contract.
///
/// `execute` runs the statement to completion and keeps the produced rows; each
/// `fetch_next` then writes one of them into the bound output buffers. Only a
/// failure on the first step is an execution error. A row that fails later is
/// held back and returned by `fetch_next` once the rows before it are consumed.
pub struct SqlitePreparedStatement<'conn> {
    stmt: Option<rusqlite::Statement<'conn>>,
    field_count: usize,
    param_count: usize,
    params: Params,
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    deferred: Option<ExecutorError>,
    affected_rows: u64,
    executed: bool,
}

impl<'conn> SqlitePreparedStatement<'conn> {
    pub(crate) fn new(stmt: rusqlite::Statement<'conn>) -> Self {
        Self {
            field_count: stmt.column_count(),
            param_count: stmt.parameter_count(),
            stmt: Some(stmt),
            params: Params::default(),
            pending: VecDeque::new(),
            current: None,
            deferred: None,
            affected_rows: 0,
            executed: false,
        }
    }

    fn status_of(outputs: &[OutputColumn]) -> FetchStatus {
        if outputs.iter().any(OutputColumn::is_truncated) {
            FetchStatus::Truncated
        } else {
            FetchStatus::Row
        }
    }
}

fn read_row(row: &rusqlite::Row<'_>, field_count: usize) -> Result<Vec<Value>, ExecutorError> {
    (0..field_count)
        .map(|i| sqlite_extract_value_sync(row, i))
        .collect()
}

impl StatementHandle for SqlitePreparedStatement<'_> {
    fn field_count(&self) -> usize {
        self.field_count
    }

    fn param_count(&self) -> usize {
        self.param_count
    }

    fn bind_params(&mut self, params: &[BindDescriptor]) -> Result<(), ExecutorError> {
        if params.len() != self.param_count {
            return Err(ExecutorError::Bind(format!(
                "statement has {} placeholders, got {} parameters",
                self.param_count,
                params.len()
            )));
        }
        self.params = Params::convert(params)?;
        Ok(())
    }

    fn bind_outputs(&mut self, outputs: &[OutputColumn]) -> Result<(), ExecutorError> {
        if outputs.len() != self.field_count {
            return Err(ExecutorError::Bind(format!(
                "result has {} columns, got {} output buffers",
                self.field_count,
                outputs.len()
            )));
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), ExecutorError> {
        let stmt = self
            .stmt
            .as_mut()
            .ok_or_else(|| ExecutorError::Exec("statement is closed".into()))?;
        let values = self.params.as_values();
        if self.field_count == 0 {
            let changed = stmt
                .execute(params_from_iter(values.iter()))
                .map_err(|e| ExecutorError::Exec(e.to_string()))?;
            self.affected_rows = changed as u64;
        } else {
            let mut rows = stmt
                .query(params_from_iter(values.iter()))
                .map_err(|e| ExecutorError::Exec(e.to_string()))?;
            let mut first = true;
            loop {
                let row = match rows.next() {
                    Ok(Some(row)) => row,
                    Ok(None) => break,
                    Err(e) if first => return Err(ExecutorError::Exec(e.to_string())),
                    Err(e) => {
                        self.deferred = Some(ExecutorError::Fetch(e.to_string()));
                        break;
                    }
                };
                first = false;
                match read_row(row, self.field_count) {
                    Ok(row_values) => self.pending.push_back(row_values),
                    Err(e) => {
                        self.deferred = Some(e);
                        break;
                    }
                }
            }
            self.affected_rows = self.pending.len() as u64;
        }
        self.executed = true;
        tracing::debug!(affected = self.affected_rows, "sqlite statement executed");
        Ok(())
    }

    fn fetch_next(&mut self, outputs: &mut [OutputColumn]) -> Result<FetchStatus, ExecutorError> {
        if !self.executed {
            return Err(ExecutorError::Fetch("statement has not been executed".into()));
        }
        self.current = self.pending.pop_front();
        let Some(row) = &self.current else {
            return match self.deferred.take() {
                Some(err) => Err(err),
                None => Ok(FetchStatus::EndOfData),
            };
        };
        for (value, output) in row.iter().zip(outputs.iter_mut()) {
            fill_column(value, output)?;
        }
        Ok(Self::status_of(outputs))
    }

    fn fetch_column(&mut self, index: usize, output: &mut OutputColumn) -> Result<(), ExecutorError> {
        let value = self
            .current
            .as_ref()
            .and_then(|row| row.get(index))
            .ok_or_else(|| ExecutorError::Fetch(format!("no current value for column {index}")))?;
        fill_column(value, output)
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        self.pending.clear();
        self.current = None;
        self.deferred = None;
        match self.stmt.take() {
            Some(stmt) => stmt.finalize().map_err(ExecutorError::SqliteError),
            None => Ok(()),
        }
    }
}
