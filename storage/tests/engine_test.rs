use std::sync::Arc;
use std::thread;
use std::time::Duration;

use helixtrack_core::{BackendConfig, Deadline, FileBackendConfig, PoolConfig, Value};
use helixtrack_storage::Engine;

fn open_file_engine(enable_wal: bool) -> Engine {
    Engine::open(
        BackendConfig::File(FileBackendConfig {
            path: ":memory:".into(),
            enable_wal,
            ..Default::default()
        }),
        PoolConfig {
            max_open: 4,
            max_idle: 4,
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn query_one_on_missing_row_is_not_found() {
    let engine = open_file_engine(true);
    engine
        .exec(
            Deadline::single_row(),
            "CREATE TABLE t (id TEXT PRIMARY KEY)",
            &[],
        )
        .unwrap();

    let err = engine
        .query_one(Deadline::single_row(), "SELECT id FROM t WHERE id = ?", &[Value::Text("nope".into())])
        .unwrap_err();
    assert_eq!(err.kind, helixtrack_core::ErrorKind::NotFound);
}

#[test]
fn wal_disabled_clamps_open_connections_to_one() {
    let engine = Arc::new(open_file_engine(false));
    engine
        .exec(Deadline::single_row(), "CREATE TABLE t (id TEXT)", &[])
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            engine
                .exec(Deadline::single_row(), "INSERT INTO t (id) VALUES (?)", &[Value::Text("x".into())])
                .unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert!(engine.stats().open_connections <= 1);
}

#[test]
fn pool_saturation_is_observable_in_metrics() {
    let engine = Arc::new(open_file_engine(true));
    engine
        .exec(
            Deadline::single_row(),
            "CREATE TABLE t (id INTEGER)",
            &[],
        )
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            // Each thread holds a transaction open briefly, forcing
            // contention over the 4-connection pool.
            let mut tx = engine.begin(Deadline::after(Duration::from_secs(5))).unwrap();
            tx.exec(Deadline::single_row(), "INSERT INTO t (id) VALUES (1)", &[])
                .unwrap();
            thread::sleep(Duration::from_millis(50));
            tx.commit(Deadline::single_row()).unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let stats = engine.stats();
    assert!(stats.open_connections <= 4);
}

#[test]
fn prepared_query_falls_back_when_sql_is_invalid_and_read_path_survives() {
    let engine = open_file_engine(true);
    engine
        .exec(Deadline::single_row(), "CREATE TABLE t (id TEXT)", &[])
        .unwrap();
    engine
        .exec(
            Deadline::single_row(),
            "INSERT INTO t (id) VALUES (?)",
            &[Value::Text("a".into())],
        )
        .unwrap();

    let rows = engine
        .prepared_query(Deadline::single_row(), "SELECT id FROM t", &[])
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn clear_prepared_statements_resets_cache_size() {
    let engine = open_file_engine(true);
    engine
        .exec(Deadline::single_row(), "CREATE TABLE t (id TEXT)", &[])
        .unwrap();
    engine
        .prepared_query(Deadline::single_row(), "SELECT id FROM t", &[])
        .unwrap();
    assert_eq!(engine.stats().prepared_statement_count, 1);
    engine.clear_prepared_statements().unwrap();
    assert_eq!(engine.stats().prepared_statement_count, 0);
}
