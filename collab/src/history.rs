//! Append-only history rows. Every guarded write emits exactly one row in
//! the same transaction as the write it records (spec §4.G): a crash
//! between the two never happens because there is no "between".

use helixtrack_core::{Deadline, EngineError, EngineResult, Row, Value};
use helixtrack_storage::{Engine, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

impl HistoryAction {
    fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Create => "create",
            HistoryAction::Update => "update",
            HistoryAction::Delete => "delete",
        }
    }

    fn parse(s: &str) -> HistoryAction {
        match s {
            "create" => HistoryAction::Create,
            "delete" => HistoryAction::Delete,
            _ => HistoryAction::Update,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub id: String,
    pub entity_id: String,
    pub version: i64,
    pub action: HistoryAction,
    pub change_summary: Option<String>,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
    /// Populated only when this row preserves a resolved conflict (spec §3);
    /// every write path in this crate currently resolves conflicts by
    /// rejecting the write rather than merging, so this stays `None` until a
    /// caller does that merge itself.
    pub conflict_data: Option<serde_json::Value>,
    pub changed_by: String,
    pub created: i64,
}

fn json_of(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Null => None,
        Value::Text(s) => serde_json::from_str(s).ok(),
        _ => None,
    }
}

fn from_row(row: &Row) -> EngineResult<HistoryRow> {
    Ok(HistoryRow {
        id: row
            .get_str("id")
            .ok_or_else(|| EngineError::backend("history row missing id"))?
            .to_string(),
        entity_id: row
            .get_str("entity_id")
            .ok_or_else(|| EngineError::backend("history row missing entity_id"))?
            .to_string(),
        version: row
            .get_i64("version")
            .ok_or_else(|| EngineError::backend("history row missing version"))?,
        action: HistoryAction::parse(row.get_str("action").unwrap_or("update")),
        change_summary: row.get_str("change_summary").map(str::to_string),
        old_data: row.get("old_data").and_then(json_of),
        new_data: row.get("new_data").and_then(json_of),
        conflict_data: row.get("conflict_data").and_then(json_of),
        changed_by: row
            .get_str("changed_by")
            .ok_or_else(|| EngineError::backend("history row missing changed_by"))?
            .to_string(),
        created: row
            .get_i64("created")
            .ok_or_else(|| EngineError::backend("history row missing created"))?,
    })
}

/// Append one history row inside an already-open transaction. `conflict_data`
/// is reserved for the day a write path resolves a conflict by merging
/// rather than rejecting (spec §3); every current caller passes `None`.
#[allow(clippy::too_many_arguments)]
pub fn append(
    tx: &mut Transaction<'_>,
    history_table: &str,
    entity_id: &str,
    version: i64,
    action: HistoryAction,
    change_summary: Option<&str>,
    old_data: Option<&serde_json::Value>,
    new_data: Option<&serde_json::Value>,
    conflict_data: Option<&serde_json::Value>,
    changed_by: &str,
    now: i64,
) -> EngineResult<()> {
    let sql = format!(
        "INSERT INTO {history_table} \
         (id, entity_id, version, action, change_summary, old_data, new_data, conflict_data, changed_by, created) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    tx.exec(
        Deadline::single_row(),
        &sql,
        &[
            Value::Text(uuid::Uuid::new_v4().to_string()),
            Value::Text(entity_id.to_string()),
            Value::Int(version),
            Value::Text(action.as_str().to_string()),
            change_summary.map(Value::from).unwrap_or(Value::Null),
            old_data
                .map(|v| Value::Text(v.to_string()))
                .unwrap_or(Value::Null),
            new_data
                .map(|v| Value::Text(v.to_string()))
                .unwrap_or(Value::Null),
            conflict_data
                .map(|v| Value::Text(v.to_string()))
                .unwrap_or(Value::Null),
            Value::Text(changed_by.to_string()),
            Value::Int(now),
        ],
    )?;
    Ok(())
}

/// All history rows for one entity, most recent version first. History rows
/// are never mutated once written, so reading them outside the write
/// transaction that produced them introduces no anomaly.
pub fn list(engine: &Engine, history_table: &str, entity_id: &str) -> EngineResult<Vec<HistoryRow>> {
    let sql = format!(
        "SELECT id, entity_id, version, action, change_summary, old_data, new_data, conflict_data, changed_by, created \
         FROM {history_table} WHERE entity_id = ? ORDER BY version DESC"
    );
    let rows = engine.query(
        Deadline::bulk(),
        &sql,
        &[Value::Text(entity_id.to_string())],
    )?;
    rows.iter().map(from_row).collect()
}

/// The history row recording a specific version, used by restore-version to
/// recover the snapshot it reverts to.
pub fn at_version(
    engine: &Engine,
    history_table: &str,
    entity_id: &str,
    version: i64,
) -> EngineResult<HistoryRow> {
    let sql = format!(
        "SELECT id, entity_id, version, action, change_summary, old_data, new_data, conflict_data, changed_by, created \
         FROM {history_table} WHERE entity_id = ? AND version = ?"
    );
    let row = engine.query_one(
        Deadline::single_row(),
        &sql,
        &[Value::Text(entity_id.to_string()), Value::Int(version)],
    )?;
    from_row(&row)
}
