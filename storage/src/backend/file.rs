//! Embedded file backend: SQLite via `rusqlite`. Booleans are stored as
//! integers; timestamps are always epoch-second integers written by
//! callers, never backend-native date/time strings.

use helixtrack_core::{EngineError, EngineResult, Row, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

struct SqlValue<'a>(&'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Bool(b) => ToSqlOutput::from(*b as i64),
            Value::Int(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.clone()),
            Value::Blob(b) => ToSqlOutput::from(b.clone()),
        })
    }
}

fn from_value_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

fn to_backend_err(e: rusqlite::Error) -> EngineError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => EngineError::not_found(e.to_string()),
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            EngineError::conflict(e.to_string())
        }
        other => EngineError::backend(other.to_string()),
    }
}

fn bind<'a>(wrapped: &'a [SqlValue<'a>]) -> Vec<&'a dyn ToSql> {
    wrapped.iter().map(|v| v as &dyn ToSql).collect()
}

pub fn query(conn: &rusqlite::Connection, sql: &str, args: &[Value]) -> EngineResult<Vec<Row>> {
    let mut stmt = conn.prepare_cached(sql).map_err(to_backend_err)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let wrapped: Vec<SqlValue<'_>> = args.iter().map(SqlValue).collect();
    let binds = bind(&wrapped);
    let rows = stmt
        .query_map(binds.as_slice(), |r| {
            let values = (0..columns.len())
                .map(|i| r.get_ref(i).map(from_value_ref))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Row::new(columns.clone(), values))
        })
        .map_err(to_backend_err)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(to_backend_err)?);
    }
    Ok(out)
}

pub fn exec(conn: &rusqlite::Connection, sql: &str, args: &[Value]) -> EngineResult<u64> {
    let wrapped: Vec<SqlValue<'_>> = args.iter().map(SqlValue).collect();
    let binds = bind(&wrapped);
    let affected = conn
        .execute(sql, binds.as_slice())
        .map_err(to_backend_err)?;
    Ok(affected as u64)
}

pub fn ping(conn: &rusqlite::Connection) -> EngineResult<()> {
    conn.query_row("SELECT 1", [], |_| Ok(()))
        .map_err(to_backend_err)
}
