//! Scripted in-memory driver.
//!
//! Plays the role a live server plays in an end-to-end suite: canned result
//! sets, canned failures, a ping toggle, and handle accounting so tests can
//! assert that every session, statement, and result handle is released
//! exactly once. Unscripted SQL fails with a syntax-error diagnostic, which
//! keeps typos in test scripts loud.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::{
    Driver, DriverError, FieldMeta, ParamValue, ResultHandle, SessionHandle, StatementHandle,
};
use crate::config::ConnectOptions;

/// Rows and field names for one canned result set.
#[derive(Debug, Clone, Default)]
pub struct CannedRows {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl CannedRows {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Option<Vec<u8>>>) -> Self {
        self.rows.push(row);
        self
    }

    /// Convenience for all-text, non-NULL rows.
    pub fn with_text_row(self, values: &[&str]) -> Self {
        self.with_row(values.iter().map(|v| Some(v.as_bytes().to_vec())).collect())
    }
}

#[derive(Debug, Clone)]
enum QueryOutcome {
    Results(Vec<CannedRows>),
    Ok { affected_rows: u64, insert_id: u64 },
    Fail(DriverError),
}

#[derive(Debug, Clone)]
struct StatementScript {
    affected_rows: u64,
    insert_id: u64,
    results: Vec<CannedRows>,
}

#[derive(Debug, Default)]
struct Counters {
    sessions_opened: usize,
    sessions_closed: usize,
    statements_opened: usize,
    statements_closed: usize,
    results_opened: usize,
    results_closed: usize,
}

#[derive(Default)]
struct MockState {
    queries: HashMap<String, QueryOutcome>,
    statement_scripts: HashMap<String, StatementScript>,
    prepare_errors: HashMap<String, DriverError>,
    connect_failures: VecDeque<DriverError>,
    ping_fails: bool,
    connects: Vec<ConnectOptions>,
    executed_queries: Vec<String>,
    executed_statements: Vec<(String, Vec<ParamValue>)>,
    counters: Counters,
}

/// Scripted driver; clone the `Arc` you wrap it in to keep scripting and
/// asserting after the `Connection` has taken ownership of its copy.
#[derive(Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock driver mutex poisoned")
    }

    /// Script one result set for an exact SQL text.
    pub fn on_query(&self, sql: &str, rows: CannedRows) {
        self.on_query_results(sql, vec![rows]);
    }

    /// Script multiple result sets, traversed via `more_results`/`next_result`.
    pub fn on_query_results(&self, sql: &str, sets: Vec<CannedRows>) {
        self.lock()
            .queries
            .insert(sql.to_string(), QueryOutcome::Results(sets));
    }

    /// Script a row-less success (INSERT/UPDATE/DDL) for an exact SQL text.
    pub fn on_execute_ok(&self, sql: &str, affected_rows: u64, insert_id: u64) {
        self.lock().queries.insert(
            sql.to_string(),
            QueryOutcome::Ok {
                affected_rows,
                insert_id,
            },
        );
    }

    pub fn on_query_error(&self, sql: &str, code: u32, message: &str) {
        self.lock().queries.insert(
            sql.to_string(),
            QueryOutcome::Fail(DriverError::new(code, message)),
        );
    }

    /// Script the outcome of executing a prepared statement.
    pub fn on_statement(&self, sql: &str, affected_rows: u64, insert_id: u64) {
        self.on_statement_with_results(sql, affected_rows, insert_id, Vec::new());
    }

    pub fn on_statement_with_results(
        &self,
        sql: &str,
        affected_rows: u64,
        insert_id: u64,
        results: Vec<CannedRows>,
    ) {
        self.lock().statement_scripts.insert(
            sql.to_string(),
            StatementScript {
                affected_rows,
                insert_id,
                results,
            },
        );
    }

    pub fn on_prepare_error(&self, sql: &str, code: u32, message: &str) {
        self.lock()
            .prepare_errors
            .insert(sql.to_string(), DriverError::new(code, message));
    }

    /// Make the next `connect` fail with the given diagnostic.
    pub fn fail_next_connect(&self, code: u32, message: &str) {
        self.lock()
            .connect_failures
            .push_back(DriverError::new(code, message));
    }

    pub fn set_ping_ok(&self, ok: bool) {
        self.lock().ping_fails = !ok;
    }

    /// Options seen by every `connect` call, in order.
    pub fn connects(&self) -> Vec<ConnectOptions> {
        self.lock().connects.clone()
    }

    pub fn executed_queries(&self) -> Vec<String> {
        self.lock().executed_queries.clone()
    }

    pub fn executed_statements(&self) -> Vec<(String, Vec<ParamValue>)> {
        self.lock().executed_statements.clone()
    }

    pub fn sessions_open(&self) -> usize {
        let state = self.lock();
        state.counters.sessions_opened - state.counters.sessions_closed
    }

    pub fn sessions_opened(&self) -> usize {
        self.lock().counters.sessions_opened
    }

    /// Outstanding handles of every kind; zero when all owners dropped.
    pub fn handles_open(&self) -> usize {
        let state = self.lock();
        let c = &state.counters;
        (c.sessions_opened - c.sessions_closed)
            + (c.statements_opened - c.statements_closed)
            + (c.results_opened - c.results_closed)
    }
}

impl Driver for MockDriver {
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn SessionHandle>, DriverError> {
        let mut state = self.lock();
        state.connects.push(options.clone());
        if let Some(err) = state.connect_failures.pop_front() {
            return Err(err);
        }
        state.counters.sessions_opened += 1;
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            shared: Arc::new(Mutex::new(SessionShared::default())),
        }))
    }
}

/// Post-execute state shared between a session and the statements it
/// prepared; models the single native handle everything hangs off.
#[derive(Debug, Default)]
struct SessionShared {
    insert_id: u64,
    affected_rows: u64,
    pending: VecDeque<CannedRows>,
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    shared: Arc<Mutex<SessionShared>>,
}

impl MockSession {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock driver mutex poisoned")
    }

    fn lock_shared(&self) -> std::sync::MutexGuard<'_, SessionShared> {
        self.shared.lock().expect("mock session mutex poisoned")
    }
}

impl SessionHandle for MockSession {
    fn ping(&mut self) -> Result<(), DriverError> {
        if self.lock_state().ping_fails {
            Err(DriverError::new(2006, "MySQL server has gone away"))
        } else {
            Ok(())
        }
    }

    fn execute(&mut self, sql: &str) -> Result<(), DriverError> {
        let outcome = {
            let mut state = self.lock_state();
            state.executed_queries.push(sql.to_string());
            state.queries.get(sql).cloned()
        };
        let mut shared = self.lock_shared();
        shared.pending.clear();
        shared.insert_id = 0;
        shared.affected_rows = 0;
        match outcome {
            Some(QueryOutcome::Results(sets)) => {
                shared.pending.extend(sets);
                Ok(())
            }
            Some(QueryOutcome::Ok {
                affected_rows,
                insert_id,
            }) => {
                shared.affected_rows = affected_rows;
                shared.insert_id = insert_id;
                Ok(())
            }
            Some(QueryOutcome::Fail(err)) => Err(err),
            None => Err(DriverError::new(
                1064,
                format!("You have an error in your SQL syntax near '{sql}'"),
            )),
        }
    }

    fn stream_result(&mut self) -> Result<Option<Box<dyn ResultHandle>>, DriverError> {
        let popped = self.lock_shared().pending.pop_front();
        match popped {
            Some(set) => {
                self.lock_state().counters.results_opened += 1;
                Ok(Some(Box::new(MockResult {
                    state: self.state.clone(),
                    fields: set.fields,
                    rows: set.rows.into(),
                })))
            }
            None => Ok(None),
        }
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn StatementHandle>, DriverError> {
        let mut state = self.lock_state();
        if let Some(err) = state.prepare_errors.get(sql) {
            return Err(err.clone());
        }
        let param_count = sql.bytes().filter(|b| *b == b'?').count();
        let script = state.statement_scripts.get(sql).cloned();
        state.counters.statements_opened += 1;
        Ok(Box::new(MockStatement {
            state: self.state.clone(),
            shared: self.shared.clone(),
            sql: sql.to_string(),
            param_count,
            script,
        }))
    }

    fn insert_id(&self) -> u64 {
        self.lock_shared().insert_id
    }

    fn affected_rows(&self) -> u64 {
        self.lock_shared().affected_rows
    }

    fn more_results(&self) -> bool {
        !self.lock_shared().pending.is_empty()
    }

    fn next_result(&mut self) -> Result<bool, DriverError> {
        Ok(!self.lock_shared().pending.is_empty())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.lock_state().counters.sessions_closed += 1;
    }
}

struct MockStatement {
    state: Arc<Mutex<MockState>>,
    shared: Arc<Mutex<SessionShared>>,
    sql: String,
    param_count: usize,
    script: Option<StatementScript>,
}

impl StatementHandle for MockStatement {
    fn param_count(&self) -> usize {
        self.param_count
    }

    fn execute(&mut self, params: &[ParamValue]) -> Result<(), DriverError> {
        {
            let mut state = self.state.lock().expect("mock driver mutex poisoned");
            state
                .executed_statements
                .push((self.sql.clone(), params.to_vec()));
        }
        let mut shared = self.shared.lock().expect("mock session mutex poisoned");
        match &self.script {
            Some(script) => {
                shared.insert_id = script.insert_id;
                shared.affected_rows = script.affected_rows;
                shared.pending = script.results.clone().into();
            }
            None => {
                shared.insert_id = 0;
                shared.affected_rows = 0;
                shared.pending.clear();
            }
        }
        Ok(())
    }
}

impl Drop for MockStatement {
    fn drop(&mut self) {
        self.state
            .lock()
            .expect("mock driver mutex poisoned")
            .counters
            .statements_closed += 1;
    }
}

struct MockResult {
    state: Arc<Mutex<MockState>>,
    fields: Vec<String>,
    rows: VecDeque<Vec<Option<Vec<u8>>>>,
}

impl ResultHandle for MockResult {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn fields(&mut self) -> Vec<FieldMeta> {
        self.fields
            .iter()
            .map(|name| FieldMeta { name: name.clone() })
            .collect()
    }

    fn fetch(&mut self) -> Result<Option<Vec<Option<Vec<u8>>>>, DriverError> {
        Ok(self.rows.pop_front())
    }
}

impl Drop for MockResult {
    fn drop(&mut self) {
        self.state
            .lock()
            .expect("mock driver mutex poisoned")
            .counters
            .results_closed += 1;
    }
}
