//! Entity-lock registry (spec §4.H). A lock row is a durable claim of
//! editing intent; it does not itself block a conflicting optimistic write
//! (that is `version`'s job) but a pessimistic lock held by someone else
//! does, and the guarded write path in [`crate::repository`] consults this
//! registry before it issues an `UPDATE`.

use helixtrack_core::{Deadline, EngineError, EngineResult, Row, Value};
use helixtrack_storage::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    /// A presence marker: any number of users may hold one at once.
    Optimistic,
    /// An exclusive claim: acquiring one while another user holds one on
    /// the same entity fails, and it blocks guarded updates from other users.
    Pessimistic,
}

impl LockType {
    fn as_str(&self) -> &'static str {
        match self {
            LockType::Optimistic => "optimistic",
            LockType::Pessimistic => "pessimistic",
        }
    }

    fn parse(s: &str) -> LockType {
        match s {
            "pessimistic" => LockType::Pessimistic,
            _ => LockType::Optimistic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityLock {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: String,
    pub lock_type: LockType,
    pub acquired_at: i64,
    pub expires_at: Option<i64>,
}

fn from_row(row: &Row) -> EngineResult<EntityLock> {
    Ok(EntityLock {
        id: row
            .get_str("id")
            .ok_or_else(|| EngineError::backend("lock row missing id"))?
            .to_string(),
        entity_type: row
            .get_str("entity_type")
            .ok_or_else(|| EngineError::backend("lock row missing entity_type"))?
            .to_string(),
        entity_id: row
            .get_str("entity_id")
            .ok_or_else(|| EngineError::backend("lock row missing entity_id"))?
            .to_string(),
        user_id: row
            .get_str("user_id")
            .ok_or_else(|| EngineError::backend("lock row missing user_id"))?
            .to_string(),
        lock_type: LockType::parse(row.get_str("lock_type").unwrap_or("optimistic")),
        acquired_at: row
            .get_i64("acquired_at")
            .ok_or_else(|| EngineError::backend("lock row missing acquired_at"))?,
        expires_at: row.get_i64("expires_at"),
    })
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Thin wrapper over the `entity_locks` table. Holds no state of its own —
/// every call goes straight through the engine, so multiple registries
/// backed by the same engine see a consistent view.
pub struct EntityLockRegistry<'a> {
    engine: &'a Engine,
}

impl<'a> EntityLockRegistry<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Drop locks for this entity whose `expires_at` has passed. Lazy
    /// pruning: run on every acquire/release/list rather than on a timer.
    fn prune_expired(&self, entity_type: &str, entity_id: &str) -> EngineResult<()> {
        self.engine.exec(
            Deadline::single_row(),
            "DELETE FROM entity_locks \
             WHERE entity_type = ? AND entity_id = ? AND expires_at IS NOT NULL AND expires_at < ?",
            &[
                Value::Text(entity_type.to_string()),
                Value::Text(entity_id.to_string()),
                Value::Int(now_epoch()),
            ],
        )?;
        Ok(())
    }

    /// Acquire (or, for the same holder, refresh) a lock. Re-acquiring by
    /// the same `(entity_type, entity_id, user_id)` is idempotent and just
    /// bumps `acquired_at`/`expires_at` (spec §4.H). Acquiring a pessimistic
    /// lock while another user already holds a pessimistic lock on the same
    /// entity fails with `LOCK_HELD`.
    pub fn acquire(
        &self,
        entity_type: &str,
        entity_id: &str,
        user_id: &str,
        lock_type: LockType,
        ttl_seconds: Option<i64>,
    ) -> EngineResult<EntityLock> {
        self.prune_expired(entity_type, entity_id)?;

        if lock_type == LockType::Pessimistic {
            let holders = self.list(entity_type, entity_id)?;
            if holders
                .iter()
                .any(|l| l.user_id != user_id && l.lock_type == LockType::Pessimistic)
            {
                return Err(EngineError::lock_held(format!(
                    "{entity_type}/{entity_id} already holds a pessimistic lock from another user"
                )));
            }
        }

        let now = now_epoch();
        let expires_at = ttl_seconds.map(|ttl| now + ttl);

        self.engine.exec(
            Deadline::single_row(),
            "INSERT INTO entity_locks (id, entity_type, entity_id, user_id, lock_type, acquired_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (entity_type, entity_id, user_id) \
             DO UPDATE SET lock_type = excluded.lock_type, acquired_at = excluded.acquired_at, expires_at = excluded.expires_at",
            &[
                Value::Text(uuid::Uuid::new_v4().to_string()),
                Value::Text(entity_type.to_string()),
                Value::Text(entity_id.to_string()),
                Value::Text(user_id.to_string()),
                Value::Text(lock_type.as_str().to_string()),
                Value::Int(now),
                expires_at.map(Value::Int).unwrap_or(Value::Null),
            ],
        )?;

        let row = self.engine.query_one(
            Deadline::single_row(),
            "SELECT id, entity_type, entity_id, user_id, lock_type, acquired_at, expires_at \
             FROM entity_locks WHERE entity_type = ? AND entity_id = ? AND user_id = ?",
            &[
                Value::Text(entity_type.to_string()),
                Value::Text(entity_id.to_string()),
                Value::Text(user_id.to_string()),
            ],
        )?;
        from_row(&row)
    }

    pub fn release(&self, entity_type: &str, entity_id: &str, user_id: &str) -> EngineResult<()> {
        let affected = self.engine.exec(
            Deadline::single_row(),
            "DELETE FROM entity_locks WHERE entity_type = ? AND entity_id = ? AND user_id = ?",
            &[
                Value::Text(entity_type.to_string()),
                Value::Text(entity_id.to_string()),
                Value::Text(user_id.to_string()),
            ],
        )?;
        if affected == 0 {
            return Err(EngineError::not_found(format!(
                "no lock held on {entity_type}/{entity_id} by {user_id}"
            )));
        }
        Ok(())
    }

    /// Active (non-expired) locks on an entity, most recently acquired
    /// first.
    pub fn list(&self, entity_type: &str, entity_id: &str) -> EngineResult<Vec<EntityLock>> {
        self.prune_expired(entity_type, entity_id)?;
        let rows = self.engine.query(
            Deadline::single_row(),
            "SELECT id, entity_type, entity_id, user_id, lock_type, acquired_at, expires_at \
             FROM entity_locks WHERE entity_type = ? AND entity_id = ? ORDER BY acquired_at DESC",
            &[
                Value::Text(entity_type.to_string()),
                Value::Text(entity_id.to_string()),
            ],
        )?;
        rows.iter().map(from_row).collect()
    }

    /// Whether `user_id`'s guarded write should be rejected: another user
    /// holds a pessimistic lock on this entity.
    pub fn blocks_write(&self, entity_type: &str, entity_id: &str, user_id: &str) -> EngineResult<bool> {
        let holders = self.list(entity_type, entity_id)?;
        Ok(holders
            .iter()
            .any(|l| l.user_id != user_id && l.lock_type == LockType::Pessimistic))
    }
}
