//! Prepared statements and positional parameter binding.

use tracing::debug;

use crate::driver::{ParamValue, StatementHandle};
use crate::error::ClientError;

/// Build a positional parameter array from mixed-type arguments.
///
/// ```
/// use myna::params;
/// use myna::driver::ParamValue;
///
/// let values: &[ParamValue] = params![5, "abc"];
/// assert_eq!(values.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::driver::ParamValue]
    };
    ($($value:expr),+ $(,)?) => {
        &[$($crate::driver::ParamValue::from($value)),+]
    };
}

/// A prepared statement with a parameter slot array of fixed length,
/// sized to the placeholder count detected at prepare time.
///
/// Bound values are stored in the slots themselves (small values inline,
/// text and blobs copied), so nothing bound has to outlive the `execute`
/// call. Slots stay bound across executions until rebound.
pub struct PreparedStatement {
    handle: Box<dyn StatementHandle>,
    params: Vec<Option<ParamValue>>,
}

impl std::fmt::Debug for PreparedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PreparedStatement {
    pub(crate) fn new(handle: Box<dyn StatementHandle>) -> Self {
        let count = handle.param_count();
        Self {
            handle,
            params: vec![None; count],
        }
    }

    /// Number of placeholders in the prepared SQL.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Bind one positional parameter. Rebinding a slot replaces its value.
    pub fn bind_param(
        &mut self,
        index: usize,
        value: impl Into<ParamValue>,
    ) -> Result<(), ClientError> {
        let count = self.params.len();
        let slot = self
            .params
            .get_mut(index)
            .ok_or(ClientError::BindIndexOutOfRange { index, count })?;
        *slot = Some(value.into());
        Ok(())
    }

    /// Bind every slot positionally from `params`, then execute.
    ///
    /// The argument count must equal [`PreparedStatement::param_count`].
    pub fn execute(&mut self, params: &[ParamValue]) -> Result<(), ClientError> {
        if params.len() != self.params.len() {
            return Err(ClientError::ParamCountMismatch {
                expected: self.params.len(),
                provided: params.len(),
            });
        }
        for (slot, value) in self.params.iter_mut().zip(params) {
            *slot = Some(value.clone());
        }
        self.execute_bound()
    }

    /// Execute with the slots bound so far; every slot must be bound.
    pub fn execute_bound(&mut self) -> Result<(), ClientError> {
        let mut bound = Vec::with_capacity(self.params.len());
        for (index, slot) in self.params.iter().enumerate() {
            match slot {
                Some(value) => bound.push(value.clone()),
                None => return Err(ClientError::UnboundParam { index }),
            }
        }
        self.handle.execute(&bound)?;
        debug!(params = bound.len(), "statement executed");
        Ok(())
    }
}
