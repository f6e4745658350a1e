//! Connection pool & pragma configurator (spec §4.C).
//!
//! Opens the selected backend with tuned parameters, applies pool-level
//! limits, and issues the post-open liveness check. The pool itself is
//! thread-safe by contract; callers never add locking around it (spec §5).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Process-wide counter handing out a distinct shared-cache identifier to
/// every pool backed by an in-memory SQLite database, so two `Engine`s
/// opened in the same process (as happens across tests) never see each
/// other's tables.
static MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

use helixtrack_core::{BackendConfig, Deadline, EngineError, EngineResult, PoolConfig};

use crate::backend::{BackendKind, Connection};
use crate::pragma;

struct PooledConn {
    conn: Connection,
    opened_at: Instant,
    last_used_at: Instant,
}

/// A point-in-time view of pool saturation, independent of query metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub open_connections: usize,
    pub in_use: usize,
    pub idle: usize,
    pub wait_count: u64,
    pub wait_duration: Duration,
    pub evicted_for_idle: u64,
    pub evicted_for_lifetime: u64,
}

pub struct ConnectionPool {
    kind: BackendKind,
    config: PoolConfig,
    backend_config: BackendConfig,
    /// Shared-cache URI backing every connection this pool opens, when the
    /// file backend is configured for `:memory:`. A plain `:memory:` path
    /// gives each connection its own private database, which breaks any
    /// pool with more than one open connection; every connection in one
    /// pool instead opens the same named, shared-cache in-memory database.
    memory_uri: Option<String>,
    idle: Mutex<VecDeque<PooledConn>>,
    checkout_ready: Condvar,
    open_count: AtomicUsize,
    in_use_count: AtomicUsize,
    wait_count: AtomicU64,
    wait_duration_nanos: AtomicU64,
    evicted_for_idle: AtomicU64,
    evicted_for_lifetime: AtomicU64,
}

impl ConnectionPool {
    /// Open the pool: build the connection string, open one connection to
    /// apply pragmas and run the liveness check, then leave the rest to be
    /// opened lazily by `checkout` (spec §4.C steps 1–4).
    pub fn open(backend_config: BackendConfig, config: PoolConfig) -> EngineResult<Self> {
        let kind = match &backend_config {
            BackendConfig::File(_) => BackendKind::File,
            BackendConfig::Network(_) => BackendKind::Network,
        };

        let memory_uri = match &backend_config {
            BackendConfig::File(f) if f.path == ":memory:" => {
                let id = MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
                Some(format!("file:helixtrack_mem_{id}?mode=memory&cache=shared"))
            }
            _ => None,
        };

        let pool = Self {
            kind,
            config,
            backend_config,
            memory_uri,
            idle: Mutex::new(VecDeque::new()),
            checkout_ready: Condvar::new(),
            open_count: AtomicUsize::new(0),
            in_use_count: AtomicUsize::new(0),
            wait_count: AtomicU64::new(0),
            wait_duration_nanos: AtomicU64::new(0),
            evicted_for_idle: AtomicU64::new(0),
            evicted_for_lifetime: AtomicU64::new(0),
        };

        // Open one connection up front; this both validates configuration
        // and doubles as the post-init liveness check (deadline 5s).
        let mut first = pool.open_new()?;
        first
            .ping(Deadline::liveness())
            .map_err(|e| EngineError::init(format!("liveness check failed: {}", e.message)))?;
        pool.open_count.fetch_add(1, Ordering::SeqCst);
        pool.idle.lock().unwrap().push_back(PooledConn {
            conn: first,
            opened_at: Instant::now(),
            last_used_at: Instant::now(),
        });

        Ok(pool)
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Effective cap on open connections: the file backend with WAL
    /// disabled is forced to a single connection (spec §4.C step 3).
    fn effective_max_open(&self) -> usize {
        match (&self.backend_config, self.kind) {
            (BackendConfig::File(f), BackendKind::File) if !f.enable_wal => 1,
            _ => self.config.max_open.max(1),
        }
    }

    fn effective_max_idle(&self) -> usize {
        match (&self.backend_config, self.kind) {
            (BackendConfig::File(f), BackendKind::File) if !f.enable_wal => 1,
            _ => self.config.max_idle.max(1),
        }
    }

    fn open_new(&self) -> EngineResult<Connection> {
        match &self.backend_config {
            BackendConfig::File(cfg) => {
                let conn = if let Some(uri) = &self.memory_uri {
                    rusqlite::Connection::open_with_flags(
                        uri,
                        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                            | rusqlite::OpenFlags::SQLITE_OPEN_URI
                            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
                    )
                } else {
                    rusqlite::Connection::open(&cfg.path)
                }
                .map_err(|e| EngineError::init(e.to_string()))?;
                pragma::apply_file_pragmas(&conn, cfg)?;
                Ok(Connection::File(conn))
            }
            BackendConfig::Network(cfg) => {
                let conn_str = pragma::network_connection_string(cfg);
                let mut client = postgres::Client::connect(&conn_str, postgres::NoTls)
                    .map_err(|e| EngineError::init(e.to_string()))?;
                pragma::apply_network_session_settings(&mut client, cfg);
                Ok(Connection::Network(Box::new(client)))
            }
        }
    }

    fn is_expired(&self, pooled: &PooledConn, now: Instant) -> bool {
        let lifetime = Duration::from_secs(self.config.conn_max_lifetime_secs);
        let idle_time = Duration::from_secs(self.config.conn_max_idle_time_secs);
        if self.config.conn_max_lifetime_secs > 0 && now.duration_since(pooled.opened_at) > lifetime
        {
            self.evicted_for_lifetime.fetch_add(1, Ordering::SeqCst);
            return true;
        }
        if self.config.conn_max_idle_time_secs > 0
            && now.duration_since(pooled.last_used_at) > idle_time
        {
            self.evicted_for_idle.fetch_add(1, Ordering::SeqCst);
            return true;
        }
        false
    }

    /// Borrow a connection, blocking until one is available or `deadline`
    /// passes. Backpressure (wait count, wait duration) is recorded on the
    /// pool so `stats()` can expose saturation (spec §5).
    pub fn checkout(&self, deadline: Deadline) -> EngineResult<PoolGuard<'_>> {
        let mut idle = self.idle.lock().unwrap();
        loop {
            while let Some(pooled) = idle.pop_front() {
                if self.is_expired(&pooled, Instant::now()) {
                    self.open_count.fetch_sub(1, Ordering::SeqCst);
                    continue;
                }
                self.in_use_count.fetch_add(1, Ordering::SeqCst);
                return Ok(PoolGuard {
                    pool: self,
                    conn: Some(pooled),
                });
            }

            if self.open_count.load(Ordering::SeqCst) < self.effective_max_open() {
                let conn = self.open_new()?;
                self.open_count.fetch_add(1, Ordering::SeqCst);
                self.in_use_count.fetch_add(1, Ordering::SeqCst);
                return Ok(PoolGuard {
                    pool: self,
                    conn: Some(PooledConn {
                        conn,
                        opened_at: Instant::now(),
                        last_used_at: Instant::now(),
                    }),
                });
            }

            if deadline.is_expired() {
                return Err(EngineError::timeout("connection pool checkout deadline exceeded"));
            }

            self.wait_count.fetch_add(1, Ordering::SeqCst);
            let wait_start = Instant::now();
            let (guard, result) = self
                .checkout_ready
                .wait_timeout(idle, deadline.remaining())
                .unwrap();
            idle = guard;
            self.wait_duration_nanos
                .fetch_add(wait_start.elapsed().as_nanos() as u64, Ordering::SeqCst);

            if result.timed_out() && idle.is_empty() && deadline.is_expired() {
                return Err(EngineError::timeout("connection pool checkout deadline exceeded"));
            }
        }
    }

    fn release(&self, mut pooled: PooledConn) {
        self.in_use_count.fetch_sub(1, Ordering::SeqCst);
        pooled.last_used_at = Instant::now();

        let mut idle = self.idle.lock().unwrap();
        if idle.len() < self.effective_max_idle() && !self.is_expired(&pooled, Instant::now()) {
            idle.push_back(pooled);
        } else {
            self.open_count.fetch_sub(1, Ordering::SeqCst);
        }
        drop(idle);
        self.checkout_ready.notify_one();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            open_connections: self.open_count.load(Ordering::SeqCst),
            in_use: self.in_use_count.load(Ordering::SeqCst),
            idle: self.idle.lock().unwrap().len(),
            wait_count: self.wait_count.load(Ordering::SeqCst),
            wait_duration: Duration::from_nanos(self.wait_duration_nanos.load(Ordering::SeqCst)),
            evicted_for_idle: self.evicted_for_idle.load(Ordering::SeqCst),
            evicted_for_lifetime: self.evicted_for_lifetime.load(Ordering::SeqCst),
        }
    }

    /// Flush every idle connection's native prepared-statement cache, used
    /// by the engine's `clear_prepared_statements` (spec §4.B).
    pub fn flush_all_prepared_caches(&self) {
        let mut idle = self.idle.lock().unwrap();
        for pooled in idle.iter_mut() {
            pooled.conn.flush_prepared_cache();
        }
    }

    /// Hand every idle connection to `f` once, used to validate a query
    /// against the live backend during statement-cache warmup.
    pub fn with_any_idle_or_new<T>(
        &self,
        deadline: Deadline,
        f: impl FnOnce(&mut Connection) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut guard = self.checkout(deadline)?;
        f(guard.connection())
    }

    pub fn close(&self) {
        let mut idle = self.idle.lock().unwrap();
        idle.clear();
        self.open_count.store(0, Ordering::SeqCst);
    }
}

/// RAII handle to a checked-out connection; returns it to the pool on drop.
pub struct PoolGuard<'a> {
    pool: &'a ConnectionPool,
    conn: Option<PooledConn>,
}

impl<'a> PoolGuard<'a> {
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn.as_mut().expect("connection taken").conn
    }
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        if let Some(pooled) = self.conn.take() {
            self.pool.release(pooled);
        }
    }
}
