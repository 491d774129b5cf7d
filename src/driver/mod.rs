//! The driver ABI the session layer is built on.
//!
//! Everything protocol-shaped lives behind these traits: connect, close,
//! ping, prepare, execute, row fetch, field metadata, and error reporting.
//! The session layer only manages handle lifetimes and call ordering; a
//! concrete driver (libmysqlclient bindings, a wire-protocol codec) supplies
//! the behavior. [`mock`] ships a scripted driver for tests.
//!
//! Handle ownership is exclusive: every `Box<dyn ...Handle>` has exactly one
//! owner, and dropping it releases the underlying resource.

pub mod mock;

use thiserror::Error;

use crate::config::ConnectOptions;

/// A failure reported by the driver, carrying the server error number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("server error {code}: {message}")]
pub struct DriverError {
    pub code: u32,
    pub message: String,
}

impl DriverError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Metadata for one column of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: String,
}

/// A positional parameter value for a prepared statement.
///
/// Values are owned by the slot they are bound into, so bound data never has
/// to outlive the caller's stack frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Int(i64),
    UInt(u64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::UInt(u64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::UInt(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Double(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(value: &[u8]) -> Self {
        ParamValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        ParamValue::Bytes(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => ParamValue::Null,
        }
    }
}

/// Entry point of a driver implementation.
pub trait Driver: Send + Sync {
    /// Establish a fresh session. The returned handle owns every network
    /// resource of the session and releases it on drop.
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn SessionHandle>, DriverError>;
}

/// One live session with the server.
pub trait SessionHandle: Send {
    /// Liveness probe; a blocking round-trip, not a cached flag.
    fn ping(&mut self) -> Result<(), DriverError>;

    /// Submit raw SQL for execution.
    fn execute(&mut self, sql: &str) -> Result<(), DriverError>;

    /// Adopt the pending streamed result of the most recent execution.
    /// `None` when the statement produced no result set.
    fn stream_result(&mut self) -> Result<Option<Box<dyn ResultHandle>>, DriverError>;

    /// Parse and prepare `sql`; the placeholder count is fixed here.
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn StatementHandle>, DriverError>;

    fn insert_id(&self) -> u64;

    fn affected_rows(&self) -> u64;

    /// Whether more result sets are pending after the current one.
    fn more_results(&self) -> bool;

    /// Advance to the next pending result set; `Ok(true)` when one exists.
    fn next_result(&mut self) -> Result<bool, DriverError>;
}

/// One prepared statement.
pub trait StatementHandle: Send {
    /// Number of placeholders, fixed at prepare time.
    fn param_count(&self) -> usize;

    /// Submit the complete parameter array and execute.
    /// `params.len()` always equals [`StatementHandle::param_count`]; the
    /// session layer enforces that before calling in.
    fn execute(&mut self, params: &[ParamValue]) -> Result<(), DriverError>;
}

/// One streamed result set. Rows are pulled from the server on demand;
/// the sequence is forward-only and non-restartable.
pub trait ResultHandle: Send {
    fn field_count(&self) -> usize;

    fn fields(&mut self) -> Vec<FieldMeta>;

    /// Pull the next row. Values are exact-length byte strings; `None` in a
    /// cell is SQL NULL, `None` overall is end-of-result.
    #[allow(clippy::type_complexity)]
    fn fetch(&mut self) -> Result<Option<Vec<Option<Vec<u8>>>>, DriverError>;
}
