use thiserror::Error;

use crate::driver::DriverError;

/// Errors surfaced by the session layer.
///
/// Driver failures keep the server error number alongside the message so
/// callers can branch on it instead of parsing diagnostic text.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection is not open")]
    NotConnected,
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("statement expects {expected} parameters, {provided} provided")]
    ParamCountMismatch { expected: usize, provided: usize },
    #[error("bind index {index} out of range for statement with {count} parameters")]
    BindIndexOutOfRange { index: usize, count: usize },
    #[error("parameter {index} was never bound")]
    UnboundParam { index: usize },
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
