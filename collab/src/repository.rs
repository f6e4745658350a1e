//! Generic repository over any [`VersionedEntity`] (spec §4.E-§4.F).
//!
//! One instantiation per entity type gets create/read/list/update/soft-delete
//! plus history and version-restore, all written exactly once against the
//! `Entity`/`VersionedEntity` contract rather than once per table.

use std::marker::PhantomData;

use helixtrack_core::{Deadline, EngineError, EngineResult, Filters, VersionedEntity};
use helixtrack_storage::Engine;

use crate::history::{self, HistoryAction, HistoryRow};
use crate::locks::EntityLockRegistry;

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

pub struct Repository<'a, E: VersionedEntity> {
    engine: &'a Engine,
    _marker: PhantomData<E>,
}

impl<'a, E: VersionedEntity> Repository<'a, E> {
    pub fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            _marker: PhantomData,
        }
    }

    fn locks(&self) -> EntityLockRegistry<'a> {
        EntityLockRegistry::new(self.engine)
    }

    fn select_columns(&self) -> String {
        let mut cols = vec!["id"];
        cols.extend_from_slice(E::columns());
        cols.join(", ")
    }

    /// Create: validate, stamp `created`/`modified`, start the version
    /// counter at 1, insert, and record the opening history row — all in
    /// one transaction (spec §4.E, §4.G).
    pub fn create(&self, mut entity: E, actor: &str) -> EngineResult<E> {
        entity.validate().map_err(EngineError::validation)?;
        let now = now_epoch();
        entity.set_created(now);
        entity.set_modified(now);
        entity.set_version(1);

        let placeholders = std::iter::once("?".to_string())
            .chain(E::columns().iter().map(|_| "?".to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (id, {}) VALUES ({})",
            E::table_name(),
            E::columns().join(", "),
            placeholders
        );
        let mut binds = vec![helixtrack_core::Value::Text(entity.id().to_string())];
        binds.extend(entity.bind_values());

        let mut tx = self.engine.begin(Deadline::single_row())?;
        tx.exec(Deadline::single_row(), &sql, &binds)?;
        history::append(
            &mut tx,
            E::history_table_name(),
            entity.id(),
            1,
            HistoryAction::Create,
            None,
            None,
            Some(&entity.to_json()),
            None,
            actor,
            now,
        )?;
        tx.commit(Deadline::single_row())?;
        Ok(entity)
    }

    pub fn read(&self, id: &str) -> EngineResult<E> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted = 0",
            self.select_columns(),
            E::table_name()
        );
        let row = self.engine.query_one(
            Deadline::single_row(),
            &sql,
            &[helixtrack_core::Value::Text(id.to_string())],
        )?;
        E::scan_row(&row)
    }

    /// List, most recently created first (spec §4.E default ordering),
    /// filtered over whatever keys in `filters` this entity recognizes and
    /// ignoring the rest.
    pub fn list(&self, filters: &Filters, limit: i64, offset: i64) -> EngineResult<Vec<E>> {
        let (clauses, mut binds) = filters.build_where(E::columns());
        let mut where_sql = "deleted = 0".to_string();
        for clause in clauses {
            where_sql.push_str(" AND ");
            where_sql.push_str(&clause);
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY created DESC LIMIT ? OFFSET ?",
            self.select_columns(),
            E::table_name(),
            where_sql
        );
        binds.push(helixtrack_core::Value::Int(limit));
        binds.push(helixtrack_core::Value::Int(offset));
        let rows = self.engine.query(Deadline::bulk(), &sql, &binds)?;
        rows.iter().map(E::scan_row).collect()
    }

    /// The optimistic-lock write path (spec §4.F): validate, bump the
    /// in-memory version to `expected + 1`, and issue a guarded `UPDATE`
    /// that only succeeds if the row is still at `expected`. A pessimistic
    /// lock held by a different user short-circuits before any SQL runs.
    pub fn update(&self, mut entity: E, actor: &str) -> EngineResult<E> {
        entity.validate().map_err(EngineError::validation)?;

        if self
            .locks()
            .blocks_write(E::table_name(), entity.id(), actor)?
        {
            return Err(EngineError::lock_held(format!(
                "{} is pessimistically locked by another user",
                entity.id()
            )));
        }

        let expected = entity.version();
        let now = now_epoch();
        entity.set_modified(now);
        entity.set_version(expected + 1);

        let mut tx = self.engine.begin(Deadline::single_row())?;

        let select_sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted = 0",
            self.select_columns(),
            E::table_name()
        );
        let before_row = tx.query_one(
            Deadline::single_row(),
            &select_sql,
            &[helixtrack_core::Value::Text(entity.id().to_string())],
        )?;
        let before = E::scan_row(&before_row)?;

        let set_clause = E::columns()
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let update_sql = format!(
            "UPDATE {} SET {} WHERE id = ? AND version = ? AND deleted = 0",
            E::table_name(),
            set_clause
        );
        let mut binds = entity.bind_values();
        binds.push(helixtrack_core::Value::Text(entity.id().to_string()));
        binds.push(helixtrack_core::Value::Int(expected));

        let affected = tx.exec(Deadline::single_row(), &update_sql, &binds)?;
        if affected == 0 {
            return Err(EngineError::version_conflict(format!(
                "{} is at a different version than expected {expected}",
                entity.id()
            )));
        }

        history::append(
            &mut tx,
            E::history_table_name(),
            entity.id(),
            entity.version(),
            HistoryAction::Update,
            None,
            Some(&before.to_json()),
            Some(&entity.to_json()),
            None,
            actor,
            now,
        )?;
        tx.commit(Deadline::single_row())?;
        Ok(entity)
    }

    /// Soft-delete: same guarded-write shape as `update` (spec §4.F/§4.G) —
    /// the delete row must land at a version this entity has never used
    /// before, or it collides with the `(entity_id, version)` unique index
    /// that every history table carries. Bumping `version` on the way down
    /// gives the delete row that fresh version, and a second `soft_delete`
    /// call naturally hits the `deleted = 0` guard in the initial select and
    /// surfaces as `NotFound` rather than a spurious conflict.
    pub fn soft_delete(&self, id: &str, actor: &str) -> EngineResult<()> {
        let mut tx = self.engine.begin(Deadline::single_row())?;

        let select_sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted = 0",
            self.select_columns(),
            E::table_name()
        );
        let before_row = tx.query_one(
            Deadline::single_row(),
            &select_sql,
            &[helixtrack_core::Value::Text(id.to_string())],
        )?;
        let before = E::scan_row(&before_row)?;
        let expected = before.version();
        let new_version = expected + 1;

        let now = now_epoch();
        let delete_sql = format!(
            "UPDATE {} SET deleted = 1, version = ?, modified = ? WHERE id = ? AND version = ? AND deleted = 0",
            E::table_name()
        );
        let affected = tx.exec(
            Deadline::single_row(),
            &delete_sql,
            &[
                helixtrack_core::Value::Int(new_version),
                helixtrack_core::Value::Int(now),
                helixtrack_core::Value::Text(id.to_string()),
                helixtrack_core::Value::Int(expected),
            ],
        )?;
        if affected == 0 {
            return Err(EngineError::version_conflict(format!(
                "{id} changed concurrently during soft-delete"
            )));
        }

        history::append(
            &mut tx,
            E::history_table_name(),
            id,
            new_version,
            HistoryAction::Delete,
            None,
            Some(&before.to_json()),
            None,
            None,
            actor,
            now,
        )?;
        tx.commit(Deadline::single_row())?;
        Ok(())
    }

    pub fn get_history(&self, id: &str) -> EngineResult<Vec<HistoryRow>> {
        history::list(self.engine, E::history_table_name(), id)
    }

    /// Restore-version: writes a new history row carrying the target
    /// version's snapshot and bumps the live row's version, but does not
    /// rewrite the live row's content columns to match the snapshot — the
    /// content in the content table is left as-is, and callers that need
    /// the restored content read it off the returned history row's
    /// `new_data` (see `DESIGN.md` for why restore only touches `version`).
    pub fn restore_version(&self, id: &str, target_version: i64, actor: &str) -> EngineResult<HistoryRow> {
        let snapshot = history::at_version(self.engine, E::history_table_name(), id, target_version)?;

        let mut tx = self.engine.begin(Deadline::single_row())?;
        let select_sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted = 0",
            self.select_columns(),
            E::table_name()
        );
        let current_row = tx.query_one(
            Deadline::single_row(),
            &select_sql,
            &[helixtrack_core::Value::Text(id.to_string())],
        )?;
        let current = E::scan_row(&current_row)?;
        let expected = current.version();
        let new_version = expected + 1;
        let now = now_epoch();

        let update_sql = format!(
            "UPDATE {} SET version = ?, modified = ? WHERE id = ? AND version = ? AND deleted = 0",
            E::table_name()
        );
        let affected = tx.exec(
            Deadline::single_row(),
            &update_sql,
            &[
                helixtrack_core::Value::Int(new_version),
                helixtrack_core::Value::Int(now),
                helixtrack_core::Value::Text(id.to_string()),
                helixtrack_core::Value::Int(expected),
            ],
        )?;
        if affected == 0 {
            return Err(EngineError::version_conflict(format!(
                "{id} changed while restoring version {target_version}"
            )));
        }

        history::append(
            &mut tx,
            E::history_table_name(),
            id,
            new_version,
            HistoryAction::Update,
            Some(&format!("restored to version {target_version}")),
            Some(&current.to_json()),
            snapshot.new_data.as_ref(),
            None,
            actor,
            now,
        )?;
        tx.commit(Deadline::single_row())?;

        history::at_version(self.engine, E::history_table_name(), id, new_version)
    }
}
