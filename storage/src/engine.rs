//! The engine: the library's sole entry point (spec §6). Ties the
//! connection pool, the statement cache and the metrics collector
//! together behind the primitives every other component calls through.

use std::time::Instant;

use helixtrack_core::{BackendConfig, Deadline, EngineResult, PoolConfig, Row, Value};

use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::pool::ConnectionPool;
use crate::statement_cache::StatementCache;
use crate::transaction::Transaction;

pub struct Engine {
    pool: ConnectionPool,
    cache: StatementCache,
    metrics: MetricsCollector,
}

impl Engine {
    /// Open the engine: build and tune the connection pool, run the
    /// liveness check, and start with an empty statement cache and zeroed
    /// metrics (spec §4.C init protocol).
    pub fn open(backend_config: BackendConfig, pool_config: PoolConfig) -> EngineResult<Self> {
        let pool = ConnectionPool::open(backend_config, pool_config)?;
        Ok(Self {
            pool,
            cache: StatementCache::new(),
            metrics: MetricsCollector::new(),
        })
    }

    fn measure<T>(
        &self,
        prepared: bool,
        f: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let start = Instant::now();
        let result = f();
        self.metrics.record_query(start.elapsed(), prepared);
        result
    }

    pub fn query(&self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<Vec<Row>> {
        self.measure(false, || {
            let mut guard = self.pool.checkout(deadline)?;
            guard.connection().query(deadline, sql, args)
        })
    }

    pub fn query_one(&self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<Row> {
        self.measure(false, || {
            let mut guard = self.pool.checkout(deadline)?;
            guard.connection().query_one(deadline, sql, args)
        })
    }

    pub fn exec(&self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<u64> {
        self.measure(false, || {
            let mut guard = self.pool.checkout(deadline)?;
            guard.connection().exec(deadline, sql, args)
        })
    }

    /// Routed through the statement cache. If preparation of the "one row"
    /// variant fails, falls through to an unprepared execution so read
    /// paths survive preparation anomalies (spec §4.B recovery rule); the
    /// operation is still counted but not cached in that case.
    pub fn prepared_query_one(
        &self,
        deadline: Deadline,
        sql: &str,
        args: &[Value],
    ) -> EngineResult<Row> {
        match self.cache.get_or_create(&self.pool, deadline, sql) {
            Ok(_) => self.measure(true, || {
                let mut guard = self.pool.checkout(deadline)?;
                guard.connection().query_one(deadline, sql, args)
            }),
            Err(e) => {
                tracing::warn!(error = %e, sql, "prepared query-one fell back to unprepared execution");
                self.measure(false, || {
                    let mut guard = self.pool.checkout(deadline)?;
                    guard.connection().query_one(deadline, sql, args)
                })
            }
        }
    }

    pub fn prepared_query(
        &self,
        deadline: Deadline,
        sql: &str,
        args: &[Value],
    ) -> EngineResult<Vec<Row>> {
        self.cache.get_or_create(&self.pool, deadline, sql)?;
        self.measure(true, || {
            let mut guard = self.pool.checkout(deadline)?;
            guard.connection().query(deadline, sql, args)
        })
    }

    pub fn prepared_exec(
        &self,
        deadline: Deadline,
        sql: &str,
        args: &[Value],
    ) -> EngineResult<u64> {
        self.cache.get_or_create(&self.pool, deadline, sql)?;
        self.measure(true, || {
            let mut guard = self.pool.checkout(deadline)?;
            guard.connection().exec(deadline, sql, args)
        })
    }

    pub fn begin(&self, deadline: Deadline) -> EngineResult<Transaction<'_>> {
        let guard = self.pool.checkout(deadline)?;
        Transaction::begin(guard, deadline)
    }

    pub fn ping(&self, deadline: Deadline) -> EngineResult<()> {
        let mut guard = self.pool.checkout(deadline)?;
        guard.connection().ping(deadline)
    }

    pub fn stats(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.pool.stats(), self.cache.len())
    }

    /// Collects but does not mask individual close failures, returning the
    /// last one (spec §4.B).
    pub fn clear_prepared_statements(&self) -> EngineResult<()> {
        self.cache.clear(&self.pool)
    }

    pub fn close(&self) {
        let _ = self.clear_prepared_statements();
        self.pool.close();
    }
}
