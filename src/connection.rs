//! Connection lifecycle over the driver ABI.
//!
//! A Connection owns:
//! - At most one live session handle, behind a mutex
//! - The driver used to (re)establish that handle
//!
//! The mutex serializes handle management (connect, close, ping, prepare,
//! query submission) only. Statements and result sets own their handles
//! outright, so row fetching never contends on it. The flip side is that one
//! connection supports one actively streaming result at a time; concurrent
//! streams need separate Connection values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, instrument, warn};

use crate::config::ConnectOptions;
use crate::driver::{Driver, SessionHandle};
use crate::error::ClientError;
use crate::result::ResultSet;
use crate::statement::PreparedStatement;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A synchronous client session.
pub struct Connection {
    id: u64,
    driver: Arc<dyn Driver>,
    handle: Mutex<Option<Box<dyn SessionHandle>>>,
}

impl Connection {
    /// Create a closed connection bound to a driver.
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst),
            driver,
            handle: Mutex::new(None),
        }
    }

    /// Convenience: create and connect in one call.
    pub fn open(driver: Arc<dyn Driver>, options: &ConnectOptions) -> Result<Self, ClientError> {
        let conn = Self::new(driver);
        conn.connect(options)?;
        Ok(conn)
    }

    /// Identifier used in log correlation; unique per process.
    pub fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn SessionHandle>>> {
        self.handle.lock().expect("connection mutex poisoned")
    }

    /// Establish a session, releasing any existing handle first.
    ///
    /// Safe to call repeatedly; a failed attempt leaves the connection
    /// closed and is safe to retry.
    #[instrument(
        skip(self, options),
        fields(conn_id = self.id, host = %options.host, port = options.port)
    )]
    pub fn connect(&self, options: &ConnectOptions) -> Result<(), ClientError> {
        let mut guard = self.lock();
        if guard.take().is_some() {
            debug!("released previous session handle before reconnect");
        }
        match self.driver.connect(options) {
            Ok(handle) => {
                *guard = Some(handle);
                debug!("session established");
                Ok(())
            }
            Err(e) => {
                warn!(code = e.code, error = %e, "failed to connect to database");
                Err(e.into())
            }
        }
    }

    /// Release the session handle; no-op when already closed.
    pub fn close(&self) {
        let mut guard = self.lock();
        if guard.take().is_some() {
            debug!(conn_id = self.id, "session closed");
        }
    }

    /// Liveness check: false without a handle, otherwise a ping round-trip.
    pub fn is_open(&self) -> bool {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(handle) => handle.ping().is_ok(),
            None => false,
        }
    }

    /// Submit raw SQL and adopt its streamed result.
    ///
    /// `Ok(Some)` carries the result set; `Ok(None)` means the statement
    /// produced no rows to stream (INSERT, DDL, ...). The result must be
    /// drained or dropped before the next statement goes out on this
    /// connection; the driver rejects interleaved streams.
    #[instrument(skip(self), fields(conn_id = self.id, sql = %sql))]
    pub fn query(&self, sql: &str) -> Result<Option<ResultSet>, ClientError> {
        let mut guard = self.lock();
        let handle = guard.as_mut().ok_or(ClientError::NotConnected)?;
        if let Err(e) = handle.execute(sql) {
            warn!(code = e.code, error = %e, "query failed");
            return Err(e.into());
        }
        match handle.stream_result()? {
            Some(result) => {
                let result = ResultSet::new(result);
                debug!(fields = result.field_count(), "streaming result adopted");
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Parse and prepare `sql`; the placeholder count is fixed here.
    #[instrument(skip(self), fields(conn_id = self.id, sql = %sql))]
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement, ClientError> {
        let mut guard = self.lock();
        let handle = guard.as_mut().ok_or(ClientError::NotConnected)?;
        match handle.prepare(sql) {
            Ok(stmt) => {
                debug!(params = stmt.param_count(), "statement prepared");
                Ok(PreparedStatement::new(stmt))
            }
            Err(e) => {
                warn!(code = e.code, error = %e, "prepare failed");
                Err(e.into())
            }
        }
    }

    /// Adopt the pending streamed result of the most recent execution, if
    /// any; used after a prepared execute or [`Connection::next_result`].
    pub fn stream_result(&self) -> Result<Option<ResultSet>, ClientError> {
        let mut guard = self.lock();
        let handle = guard.as_mut().ok_or(ClientError::NotConnected)?;
        Ok(handle.stream_result()?.map(ResultSet::new))
    }

    /// Autoincrement id generated by the last insert; `-1` when closed.
    pub fn insert_id(&self) -> i64 {
        self.lock().as_ref().map_or(-1, |h| h.insert_id() as i64)
    }

    /// Rows affected by the last statement; `-1` when closed.
    pub fn affected_rows(&self) -> i64 {
        self.lock()
            .as_ref()
            .map_or(-1, |h| h.affected_rows() as i64)
    }

    /// Whether more result sets are pending after the current one.
    pub fn more_results(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| h.more_results())
    }

    /// Advance to the next pending result set; `Ok(true)` when one exists.
    pub fn next_result(&self) -> Result<bool, ClientError> {
        let mut guard = self.lock();
        let handle = guard.as_mut().ok_or(ClientError::NotConnected)?;
        Ok(handle.next_result()?)
    }
}
