//! Generic entity traits.
//!
//! The donor system emits nearly identical SQL per table via dynamic
//! dispatch on entity kind. Spec §9 calls for factoring that into a small
//! trait describing `{table_name, columns, scan_row, bind_row,
//! history_table}`, so the guarded-update and history-emission algorithms
//! are written exactly once and shared by every versioned entity type.

use crate::error::EngineResult;
use crate::value::{Row, Value};

/// Any row-backed entity with the core row convention: `id`, `created`,
/// `modified`, `deleted`.
pub trait Entity: Sized + Clone {
    /// Table holding this entity's rows.
    fn table_name() -> &'static str;

    /// Column names, in the exact order `bind_values` produces them,
    /// excluding `id`.
    fn columns() -> &'static [&'static str];

    /// Opaque identifier of this row.
    fn id(&self) -> &str;

    fn created(&self) -> i64;
    fn set_created(&mut self, value: i64);

    fn modified(&self) -> i64;
    fn set_modified(&mut self, value: i64);

    fn deleted(&self) -> bool;
    fn set_deleted(&mut self, value: bool);

    /// Validate intrinsic constraints before any backend call (spec §4.F
    /// step 1). Returns a human-readable reason on failure.
    fn validate(&self) -> Result<(), String>;

    /// Build a full row from a backend [`Row`], in the shape scanned by a
    /// `SELECT id, <columns...> FROM table_name` query.
    fn scan_row(row: &Row) -> EngineResult<Self>;

    /// Produce bind values in `columns()` order, for INSERT/UPDATE.
    fn bind_values(&self) -> Vec<Value>;

    /// A JSON snapshot of the entity for history rows.
    fn to_json(&self) -> serde_json::Value;
}

/// An [`Entity`] that additionally participates in optimistic concurrency
/// control: it carries a monotonic `version` and has a matching history
/// table (spec §3, §4.F, §4.G).
pub trait VersionedEntity: Entity {
    /// History table for this entity type.
    fn history_table_name() -> &'static str;

    fn version(&self) -> i64;
    fn set_version(&mut self, value: i64);
}
