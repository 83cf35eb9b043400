/// Marker row type for statements run only for their side effect.
///
/// `Results<ExecOnly>` carries an affected-row count and an error message; it
/// cannot be filled by [`Executor::query_all_into`](crate::Executor::query_all_into)
/// because `ExecOnly` is not an [`OutputRow`](crate::binder::OutputRow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOnly;

/// Everything a call produced: typed rows, their NULL flags, the affected-row
/// count and the error text of a failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct Results<T> {
    /// One entry per fetched row.
    pub rows: Vec<T>,
    /// `null_flags[r][c]` is 1 when column `c` of row `r` was SQL NULL.
    pub null_flags: Vec<Vec<u8>>,
    /// Rows changed by a DML statement, or rows fetched by a query.
    pub affected_rows: u64,
    /// Empty unless the call that filled this value failed.
    pub error_message: String,
}

impl<T> Default for Results<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            null_flags: Vec::new(),
            affected_rows: 0,
            error_message: String::new(),
        }
    }
}

impl<T> Results<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_rows(rows: Vec<T>, null_flags: Vec<Vec<u8>>) -> Self {
        Self {
            affected_rows: rows.len() as u64,
            rows,
            null_flags,
            error_message: String::new(),
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.null_flags.clear();
        self.affected_rows = 0;
        self.error_message.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the call that filled this value succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error_message.is_empty()
    }

    /// Whether column `column` of row `row` was NULL. Out-of-range positions are `false`.
    #[must_use]
    pub fn is_null(&self, row: usize, column: usize) -> bool {
        self.null_flags
            .get(row)
            .and_then(|flags| flags.get(column))
            .is_some_and(|flag| *flag != 0)
    }

    /// Rows paired with their NULL flags.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &[u8])> {
        self.rows
            .iter()
            .zip(self.null_flags.iter().map(Vec::as_slice))
    }
}
