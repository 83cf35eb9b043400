use crate::error::ExecutorError;
use crate::statement::StatementHandle;
use crate::types::BindDescriptor;

/// A fixed-arity list of input values, implemented for `()` and for tuples of
/// [`BindValue`](super::BindValue) up to twelve elements.
pub trait Params {
    const COUNT: usize;

    /// One descriptor per value, in positional order.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Bind`] if a value cannot be encoded.
    fn describe(&self) -> Result<Vec<BindDescriptor>, ExecutorError>;
}

impl Params for () {
    const COUNT: usize = 0;

    fn describe(&self) -> Result<Vec<BindDescriptor>, ExecutorError> {
        Ok(Vec::new())
    }
}

/// Owns the parameter descriptors for the duration of one call.
#[derive(Debug, Clone)]
pub struct ParamBinder {
    descriptors: Vec<BindDescriptor>,
}

impl ParamBinder {
    /// Encode every value of `params`.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Bind`] if a value has no wire representation.
    pub fn new<P: Params>(params: &P) -> Result<Self, ExecutorError> {
        Ok(Self {
            descriptors: params.describe()?,
        })
    }

    #[must_use]
    pub fn descriptors(&self) -> &[BindDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Hand the descriptors to the statement.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Bind`] when the statement rejects them, e.g. on an
    /// arity mismatch. Other error kinds from the transport are folded into `Bind`.
    pub fn bind<T: StatementHandle + ?Sized>(&self, stmt: &mut T) -> Result<(), ExecutorError> {
        stmt.bind_params(&self.descriptors).map_err(|e| match e {
            ExecutorError::Bind(_) => e,
            other => ExecutorError::Bind(other.to_string()),
        })
    }
}
