use std::sync::Arc;

use anyhow::Result;
use myna::driver::mock::{CannedRows, MockDriver};
use myna::driver::ParamValue;
use myna::{params, ClientError, ConnectOptions, Connection};

fn options() -> ConnectOptions {
    ConnectOptions::new("127.0.0.1", "app")
        .with_password("secret")
        .with_database("app_test")
}

fn unique_marker(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{prefix}_{nanos}")
}

#[test]
fn select_one_roundtrip() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_query("SELECT 1", CannedRows::new(&["1"]).with_text_row(&["1"]));

    let conn = Connection::open(driver.clone(), &options())?;
    assert!(conn.is_open());

    let mut result = conn.query("SELECT 1")?.expect("SELECT streams a result");
    assert_eq!(result.field_count(), 1);

    let row = result.fetch_row()?.expect("exactly one row");
    assert_eq!(row.len(), 1);
    assert_eq!(row.get(0), Some(&b"1"[..]));

    assert!(result.fetch_row()?.is_none());
    assert!(result.fetch_row()?.is_none());
    Ok(())
}

#[test]
fn connections_get_distinct_log_ids() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    let first = Connection::open(driver.clone(), &options())?;
    let second = Connection::open(driver.clone(), &options())?;
    assert_ne!(first.id(), second.id());
    Ok(())
}

#[test]
fn connect_options_reach_the_driver() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    let _conn = Connection::open(driver.clone(), &options())?;

    let seen = driver.connects();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].host, "127.0.0.1");
    assert_eq!(seen[0].user, "app");
    assert_eq!(seen[0].database, "app_test");
    assert_eq!(seen[0].port, 3306);
    Ok(())
}

#[test]
fn malformed_sql_fails_but_connection_survives() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_query("SELECT 1", CannedRows::new(&["1"]).with_text_row(&["1"]));

    let conn = Connection::open(driver.clone(), &options())?;

    let err = conn.query("").expect_err("empty SQL is rejected");
    match err {
        ClientError::Driver(e) => assert_eq!(e.code, 1064),
        other => panic!("unexpected error: {other}"),
    }

    driver.on_query_error("SELECT FROM", 1064, "syntax error near 'FROM'");
    let err = conn.query("SELECT FROM").expect_err("malformed SQL is rejected");
    match err {
        ClientError::Driver(e) => assert!(e.message.contains("FROM")),
        other => panic!("unexpected error: {other}"),
    }

    // The session handle is untouched by a failed query.
    assert!(conn.is_open());
    assert!(conn.query("SELECT 1")?.is_some());
    assert_eq!(
        driver.executed_queries(),
        vec!["", "SELECT FROM", "SELECT 1"]
    );
    Ok(())
}

#[test]
fn prepared_insert_binds_positionally() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_statement("INSERT INTO t VALUES (?, ?)", 1, 42);

    let conn = Connection::open(driver.clone(), &options())?;
    let mut stmt = conn.prepare("INSERT INTO t VALUES (?, ?)")?;
    assert_eq!(stmt.param_count(), 2);

    stmt.execute(params![5, "abc"])?;

    assert_eq!(conn.insert_id(), 42);
    assert_eq!(conn.affected_rows(), 1);

    let executed = driver.executed_statements();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].0, "INSERT INTO t VALUES (?, ?)");
    assert_eq!(
        executed[0].1,
        vec![ParamValue::Int(5), ParamValue::Text("abc".to_string())]
    );
    Ok(())
}

#[test]
fn prepared_statement_arity_is_enforced() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    let conn = Connection::open(driver.clone(), &options())?;

    let mut stmt = conn.prepare("INSERT INTO t VALUES (?, ?)")?;
    assert!(matches!(
        stmt.execute(params![5]),
        Err(ClientError::ParamCountMismatch {
            expected: 2,
            provided: 1
        })
    ));
    assert!(matches!(
        stmt.bind_param(2, "x"),
        Err(ClientError::BindIndexOutOfRange { index: 2, count: 2 })
    ));

    stmt.bind_param(0, 5)?;
    assert!(matches!(
        stmt.execute_bound(),
        Err(ClientError::UnboundParam { index: 1 })
    ));
    stmt.bind_param(1, "x")?;
    stmt.execute_bound()?;

    // Nothing reached the driver until the arity checks passed.
    assert_eq!(driver.executed_statements().len(), 1);
    Ok(())
}

#[test]
fn prepare_failure_is_reported_with_server_code() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_prepare_error("SELECT * FRM t", 1064, "syntax error near 'FRM'");

    let conn = Connection::open(driver.clone(), &options())?;
    let err = conn.prepare("SELECT * FRM t").expect_err("prepare fails");
    match err {
        ClientError::Driver(e) => {
            assert_eq!(e.code, 1064);
            assert!(e.message.contains("FRM"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(conn.is_open());
    Ok(())
}

#[test]
fn prepared_select_streams_through_the_connection() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_statement_with_results(
        "SELECT name FROM users WHERE id = ?",
        0,
        0,
        vec![CannedRows::new(&["name"]).with_text_row(&["ada"])],
    );

    let conn = Connection::open(driver.clone(), &options())?;
    let mut stmt = conn.prepare("SELECT name FROM users WHERE id = ?")?;
    stmt.execute(params![1])?;

    let mut result = conn
        .stream_result()?
        .expect("statement left a pending result");
    let row = result.fetch_row()?.expect("one row");
    assert_eq!(row.get_str(0), Some("ada"));
    assert!(result.fetch_row()?.is_none());
    Ok(())
}

#[test]
fn multi_result_traversal() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_query_results(
        "CALL report()",
        vec![
            CannedRows::new(&["a"]).with_text_row(&["1"]),
            CannedRows::new(&["b"]).with_text_row(&["2"]),
        ],
    );

    let conn = Connection::open(driver.clone(), &options())?;
    let mut first = conn.query("CALL report()")?.expect("first result");
    assert_eq!(first.fetch_row()?.expect("row").get_str(0), Some("1"));
    assert!(first.fetch_row()?.is_none());
    drop(first);

    assert!(conn.more_results());
    assert!(conn.next_result()?);
    let mut second = conn.stream_result()?.expect("second result");
    assert_eq!(second.fetch_row()?.expect("row").get_str(0), Some("2"));
    drop(second);

    assert!(!conn.more_results());
    assert!(!conn.next_result()?);
    assert!(conn.stream_result()?.is_none());
    Ok(())
}

#[test]
fn fetch_array_keys_by_field_name() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_query(
        "SELECT id, name FROM users",
        CannedRows::new(&["id", "name"])
            .with_text_row(&["1", "ada"])
            .with_row(vec![Some(b"2".to_vec()), None]),
    );

    let conn = Connection::open(driver.clone(), &options())?;
    let mut result = conn.query("SELECT id, name FROM users")?.expect("rows");

    let row = result.fetch_array()?.expect("first row");
    assert_eq!(row.get("id"), Some(&Some(b"1".to_vec())));
    assert_eq!(row.get("name"), Some(&Some(b"ada".to_vec())));

    let row = result.next_array()?.expect("second row");
    assert_eq!(row.get("name"), Some(&None));

    assert!(result.fetch_array()?.is_none());
    Ok(())
}

#[test]
fn every_handle_is_released_exactly_once() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    driver.on_query("SELECT 1", CannedRows::new(&["1"]).with_text_row(&["1"]));
    driver.on_statement("INSERT INTO t VALUES (?)", 1, 1);

    {
        let conn = Connection::open(driver.clone(), &options())?;
        let result = conn.query("SELECT 1")?.expect("result");
        let stmt = conn.prepare("INSERT INTO t VALUES (?)")?;
        assert_eq!(driver.handles_open(), 3);

        // Moves transfer ownership; the originals are statically gone and
        // only the final owner releases each handle.
        let moved_result = result;
        let moved_stmt = stmt;
        drop(moved_result);
        drop(moved_stmt);
        assert_eq!(driver.handles_open(), 1);
    }
    assert_eq!(driver.handles_open(), 0);
    Ok(())
}

#[test]
fn close_then_reconnect_cycle() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    let conn = Connection::open(driver.clone(), &options())?;

    conn.close();
    assert!(!conn.is_open());
    conn.close();
    assert!(matches!(
        conn.query("SELECT 1"),
        Err(ClientError::NotConnected)
    ));
    assert_eq!(conn.insert_id(), -1);
    assert_eq!(conn.affected_rows(), -1);

    conn.connect(&options())?;
    assert!(conn.is_open());
    assert_eq!(driver.sessions_opened(), 2);
    assert_eq!(driver.sessions_open(), 1);
    Ok(())
}

#[test]
fn connect_options_load_from_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("{}.toml", unique_marker("myna_opts")));
    std::fs::write(
        &path,
        "host = \"db.internal\"\nuser = \"app\"\npassword = \"secret\"\ndatabase = \"orders\"\nport = 3307\n",
    )?;

    let opts = ConnectOptions::load(&path)?;
    std::fs::remove_file(&path).ok();

    assert_eq!(opts.host, "db.internal");
    assert_eq!(opts.user, "app");
    assert_eq!(opts.password, "secret");
    assert_eq!(opts.database, "orders");
    assert_eq!(opts.port, 3307);
    assert!(opts.unix_socket.is_none());
    assert_eq!(opts.client_flags, 0);
    Ok(())
}

#[test]
fn escape_protects_literals_end_to_end() -> Result<()> {
    let driver = Arc::new(MockDriver::new());
    let name = "O'Brien";
    let sql = format!("INSERT INTO users (name) VALUES ('{}')", myna::escape(name));
    assert_eq!(sql, "INSERT INTO users (name) VALUES ('O\\'Brien')");

    driver.on_execute_ok(&sql, 1, 7);
    let conn = Connection::open(driver.clone(), &options())?;
    assert!(conn.query(&sql)?.is_none(), "INSERT streams no rows");
    assert_eq!(conn.insert_id(), 7);
    assert_eq!(conn.affected_rows(), 1);
    Ok(())
}
