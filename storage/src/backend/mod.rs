//! Backend driver abstraction (spec §4.A).
//!
//! Hides placeholder dialect, boolean-as-integer storage, and timestamp
//! representation differences between the embedded file backend and the
//! networked backend behind four primitives: `query`, `query_one`, `exec`
//! and `begin`. Callers always write `?` for positional placeholders
//! regardless of which backend is selected underneath.

pub mod file;
pub mod network;
pub mod placeholder;

use helixtrack_core::{Deadline, EngineResult, Row, Value};

/// Which backend a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Embedded file backend (at most one concurrent writer without WAL).
    File,
    /// Networked client/server relational backend.
    Network,
}

/// A single live connection to either backend. Owns exactly one driver
/// handle; the connection pool is the only thing that creates, borrows out
/// and closes these.
pub enum Connection {
    File(rusqlite::Connection),
    Network(Box<postgres::Client>),
}

impl Connection {
    pub fn kind(&self) -> BackendKind {
        match self {
            Connection::File(_) => BackendKind::File,
            Connection::Network(_) => BackendKind::Network,
        }
    }

    pub fn query(&mut self, _deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<Vec<Row>> {
        match self {
            Connection::File(conn) => file::query(conn, sql, args),
            Connection::Network(client) => network::query(client, sql, args),
        }
    }

    pub fn query_one(&mut self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<Row> {
        let mut rows = self.query(deadline, sql, args)?;
        if rows.is_empty() {
            return Err(helixtrack_core::EngineError::not_found(format!(
                "no row for query: {sql}"
            )));
        }
        Ok(rows.remove(0))
    }

    pub fn exec(&mut self, _deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<u64> {
        match self {
            Connection::File(conn) => file::exec(conn, sql, args),
            Connection::Network(client) => network::exec(client, sql, args),
        }
    }

    pub fn ping(&mut self, _deadline: Deadline) -> EngineResult<()> {
        match self {
            Connection::File(conn) => file::ping(conn),
            Connection::Network(client) => network::ping(client),
        }
    }

    /// Ask the backend's own native statement cache to forget everything it
    /// has prepared for this connection.
    pub fn flush_prepared_cache(&mut self) {
        match self {
            Connection::File(conn) => conn.flush_prepared_statement_cache(),
            Connection::Network(_) => {
                // postgres::Client caches statements per-call; there is no
                // process-wide handle to flush beyond dropping the client.
            }
        }
    }

    /// Validate that `sql` can be prepared against this backend, used by the
    /// statement cache's get-or-create path (spec §4.B).
    pub fn validate_preparable(&mut self, sql: &str) -> EngineResult<()> {
        match self {
            Connection::File(conn) => {
                conn.prepare_cached(sql)
                    .map_err(|e| helixtrack_core::EngineError::backend(e.to_string()))?;
                Ok(())
            }
            Connection::Network(client) => {
                client
                    .prepare(sql)
                    .map_err(|e| helixtrack_core::EngineError::backend(e.to_string()))?;
                Ok(())
            }
        }
    }
}
