//! Networked backend: a client/server relational database via the blocking
//! `postgres` client. Placeholders are rewritten from the engine's `?`
//! dialect to `$1, $2, ...` before every call.

use bytes::BytesMut;
use helixtrack_core::{EngineError, EngineResult, Row, Value};
use postgres::types::{IsNull, ToSql, Type};
use postgres::Client;

use super::placeholder::to_postgres;

#[derive(Debug)]
struct SqlValue<'a>(&'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => i.to_sql(ty, out),
            Value::Float(f) => f.to_sql(ty, out),
            Value::Text(s) => s.to_sql(ty, out),
            Value::Blob(b) => b.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    postgres::types::to_sql_checked!();
}

fn to_backend_err(e: postgres::Error) -> EngineError {
    if let Some(db_err) = e.as_db_error() {
        if db_err.code() == &postgres::error::SqlState::UNIQUE_VIOLATION {
            return EngineError::conflict(e.to_string());
        }
    }
    EngineError::backend(e.to_string())
}

fn extract(row: &postgres::Row, idx: usize) -> Value {
    let col_type = row.columns()[idx].type_();
    match *col_type {
        Type::BOOL => row
            .get::<_, Option<bool>>(idx)
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        Type::INT2 | Type::INT4 => row
            .get::<_, Option<i32>>(idx)
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),
        Type::INT8 => row
            .get::<_, Option<i64>>(idx)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        Type::FLOAT4 => row
            .get::<_, Option<f32>>(idx)
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),
        Type::FLOAT8 => row
            .get::<_, Option<f64>>(idx)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        Type::BYTEA => row
            .get::<_, Option<Vec<u8>>>(idx)
            .map(Value::Blob)
            .unwrap_or(Value::Null),
        _ => row
            .get::<_, Option<String>>(idx)
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}

pub fn query(client: &mut Client, sql: &str, args: &[Value]) -> EngineResult<Vec<Row>> {
    let rewritten = to_postgres(sql);
    let wrapped: Vec<SqlValue<'_>> = args.iter().map(SqlValue).collect();
    let binds: Vec<&(dyn ToSql + Sync)> = wrapped.iter().map(|v| v as _).collect();
    let rows = client
        .query(&rewritten, binds.as_slice())
        .map_err(to_backend_err)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        let values: Vec<Value> = (0..row.len()).map(|i| extract(row, i)).collect();
        out.push(Row::new(columns, values));
    }
    Ok(out)
}

pub fn exec(client: &mut Client, sql: &str, args: &[Value]) -> EngineResult<u64> {
    let rewritten = to_postgres(sql);
    let wrapped: Vec<SqlValue<'_>> = args.iter().map(SqlValue).collect();
    let binds: Vec<&(dyn ToSql + Sync)> = wrapped.iter().map(|v| v as _).collect();
    client
        .execute(&rewritten, binds.as_slice())
        .map_err(to_backend_err)
}

pub fn ping(client: &mut Client) -> EngineResult<()> {
    client
        .simple_query("SELECT 1")
        .map_err(to_backend_err)?;
    Ok(())
}
