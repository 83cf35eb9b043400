use crate::config::ExecutorOptions;
use crate::error::ExecutorError;
use crate::statement::StatementHandle;
use crate::types::{FetchStatus, OutputColumn, WireType};

use super::value::ColumnValue;

/// A row shape: a tuple of [`ColumnValue`] types up to twelve elements.
pub trait OutputRow: Sized {
    const ARITY: usize;

    /// One freshly sized output buffer per column, in declaration order.
    fn columns(options: &ExecutorOptions) -> Vec<OutputColumn>;

    /// Decode the current contents of the bound buffers.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Fetch`] if a column holds bytes its type cannot decode.
    fn decode(columns: &[OutputColumn]) -> Result<Self, ExecutorError>;
}

pub(crate) fn output_column<T: ColumnValue>(options: &ExecutorOptions) -> OutputColumn {
    OutputColumn::with_capacity(T::WIRE_TYPE, T::capacity(options), T::UNSIGNED)
}

pub(crate) fn decode_column<T: ColumnValue>(
    columns: &[OutputColumn],
    idx: usize,
) -> Result<T, ExecutorError> {
    let col = columns
        .get(idx)
        .ok_or_else(|| ExecutorError::Fetch(format!("row has no column {idx}")))?;
    if col.is_null() {
        return Ok(T::null_value());
    }
    T::decode(col.data()).map_err(|e| e.at_column(idx))
}

pub(crate) fn decode_text_row(columns: &[OutputColumn]) -> Result<Vec<String>, ExecutorError> {
    (0..columns.len())
        .map(|idx| decode_column::<String>(columns, idx))
        .collect()
}

fn as_fetch_error(err: ExecutorError) -> ExecutorError {
    match err {
        ExecutorError::Fetch(_) | ExecutorError::Truncation { .. } => err,
        other => ExecutorError::Fetch(other.to_string()),
    }
}

/// Decoded rows and their positionally aligned NULL flags (1 = NULL).
pub type FetchedRows<Out> = (Vec<Out>, Vec<Vec<u8>>);

/// Owns the output buffers for one fetch loop and turns fetched rows into values.
#[derive(Debug)]
pub struct ResultBinder {
    columns: Vec<OutputColumn>,
    max_column_bytes: usize,
}

impl ResultBinder {
    /// Buffers shaped after the declared row type.
    #[must_use]
    pub fn for_row<Out: OutputRow>(options: &ExecutorOptions) -> Self {
        Self {
            columns: Out::columns(options),
            max_column_bytes: options.max_column_bytes,
        }
    }

    /// `field_count` string buffers, for reading any result set as text.
    #[must_use]
    pub fn text(field_count: usize, options: &ExecutorOptions) -> Self {
        Self {
            columns: (0..field_count)
                .map(|_| {
                    OutputColumn::with_capacity(
                        WireType::String,
                        options.initial_column_capacity,
                        false,
                    )
                })
                .collect(),
            max_column_bytes: options.max_column_bytes,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Register the output buffers with the statement.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Bind`] if the statement rejects the buffer layout.
    pub fn bind<T: StatementHandle + ?Sized>(&self, stmt: &mut T) -> Result<(), ExecutorError> {
        stmt.bind_outputs(&self.columns).map_err(|e| match e {
            ExecutorError::Bind(_) => e,
            other => ExecutorError::Bind(other.to_string()),
        })
    }

    /// Fetch every remaining row of an executed statement.
    ///
    /// Rows are only handed back once the cursor is exhausted; on error nothing
    /// fetched so far is returned.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Fetch`] on a protocol failure or undecodable column and
    /// [`ExecutorError::Truncation`] when a column outgrows `max_column_bytes`.
    pub fn fetch_all<T, Out, F>(
        &mut self,
        stmt: &mut T,
        decode: F,
    ) -> Result<FetchedRows<Out>, ExecutorError>
    where
        T: StatementHandle + ?Sized,
        F: Fn(&[OutputColumn]) -> Result<Out, ExecutorError>,
    {
        let mut rows = Vec::new();
        let mut null_flags = Vec::new();
        loop {
            let status = stmt.fetch_next(&mut self.columns).map_err(as_fetch_error)?;
            match status {
                FetchStatus::EndOfData => break,
                FetchStatus::Row if !self.columns.iter().any(OutputColumn::is_truncated) => {}
                FetchStatus::Row | FetchStatus::Truncated => self.refetch_truncated(stmt)?,
            }
            rows.push(decode(&self.columns)?);
            null_flags.push(self.null_flags());
        }
        tracing::debug!(rows = rows.len(), columns = self.columns.len(), "fetch complete");
        Ok((rows, null_flags))
    }

    fn null_flags(&self) -> Vec<u8> {
        self.columns.iter().map(|c| u8::from(c.is_null())).collect()
    }

    fn refetch_truncated<T: StatementHandle + ?Sized>(
        &mut self,
        stmt: &mut T,
    ) -> Result<(), ExecutorError> {
        for (idx, col) in self.columns.iter_mut().enumerate() {
            if !col.is_truncated() {
                continue;
            }
            let required = col.length();
            if required > self.max_column_bytes {
                return Err(ExecutorError::Truncation {
                    column: idx,
                    required,
                    limit: self.max_column_bytes,
                });
            }
            tracing::debug!(
                column = idx,
                from = col.capacity(),
                to = required,
                "growing output column"
            );
            col.grow(required);
            stmt.fetch_column(idx, col).map_err(as_fetch_error)?;
            if col.is_truncated() {
                return Err(ExecutorError::Truncation {
                    column: idx,
                    required: col.length(),
                    limit: col.capacity(),
                });
            }
        }
        Ok(())
    }
}
