//! Synchronous MySQL-style client session layer.
//!
//! This crate manages the lifecycle of a database session: exclusive
//! ownership of the session handle, prepared statements with positional
//! parameter binding, and streamed result sets with borrowed row views.
//! Everything protocol-shaped (networking, authentication, execution) lives
//! behind the [`driver`] trait family; the crate ships a scripted
//! [`driver::mock`] driver for tests.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use myna::driver::mock::{CannedRows, MockDriver};
//! use myna::{params, ConnectOptions, Connection};
//!
//! # fn main() -> Result<(), myna::ClientError> {
//! let driver = Arc::new(MockDriver::new());
//! driver.on_query("SELECT 1", CannedRows::new(&["1"]).with_text_row(&["1"]));
//!
//! let conn = Connection::open(driver, &ConnectOptions::new("localhost", "app"))?;
//! let mut result = conn.query("SELECT 1")?.expect("SELECT streams a result");
//! while let Some(row) = result.fetch_row()? {
//!     assert_eq!(row.get_str(0), Some("1"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod escape;
pub mod result;
pub mod statement;

/// Options handed to the driver when establishing a session.
///
/// See [`ConnectOptions`] for details.
pub use config::ConnectOptions;

/// A synchronous client session.
///
/// See [`Connection`] for details.
pub use connection::Connection;

/// The collaborator ABI and parameter values.
pub use driver::{Driver, DriverError, ParamValue};

/// Errors surfaced by the session layer.
///
/// See [`ClientError`] for details.
pub use error::ClientError;

/// Escape text for inclusion inside a quoted SQL string literal.
pub use escape::escape;

/// Streamed results and borrowed row views.
pub use result::{ResultSet, Row};

/// A prepared statement with positional parameter slots.
///
/// See [`PreparedStatement`] for details.
pub use statement::PreparedStatement;
