//! The repository's non-CRUD special operations (spec §4.E): duplicate,
//! breadcrumb, get-or-create-by-name and search. None of these depend on
//! optimistic locking, so they are written directly against [`Engine`]
//! rather than through [`crate::repository::Repository`].

use std::collections::HashSet;

use helixtrack_core::{Deadline, EngineError, EngineResult, Row, Value};
use helixtrack_storage::Engine;

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Copy a document into a new row under the same parent. The core fields
/// (spec §4.E / scenario 3) must always succeed — they're the identity of
/// the new document — so they land in their own insert, starting fresh at
/// `status = 'draft'`, `version = 1`. The content copy is a second, best-
/// effort step: a failure there is logged and swallowed rather than
/// unwinding the document that already exists.
pub fn duplicate_document(engine: &Engine, source_id: &str, new_id: &str) -> EngineResult<()> {
    let source = engine.query_one(
        Deadline::single_row(),
        "SELECT parent_id, title FROM documents WHERE id = ? AND deleted = 0",
        &[Value::Text(source_id.to_string())],
    )?;
    let parent_id = source.get("parent_id").cloned().unwrap_or(Value::Null);
    let title = source.get_str("title").unwrap_or_default();

    engine.exec(
        Deadline::single_row(),
        "INSERT INTO documents (id, parent_id, title, status, version, created, deleted) \
         VALUES (?, ?, ?, 'draft', 1, ?, 0)",
        &[
            Value::Text(new_id.to_string()),
            parent_id,
            Value::Text(format!("{title} (copy)")),
            Value::Int(now_epoch()),
        ],
    )?;

    if let Err(e) = copy_content(engine, source_id, new_id) {
        tracing::warn!(error = %e, source_id, new_id, "duplicate-document content copy failed; core row kept");
    }
    Ok(())
}

fn copy_content(engine: &Engine, source_id: &str, new_id: &str) -> EngineResult<()> {
    let body = engine
        .query(
            Deadline::single_row(),
            "SELECT body FROM document_content WHERE document_id = ?",
            &[Value::Text(source_id.to_string())],
        )?
        .into_iter()
        .next()
        .and_then(|row| row.get_str("body").map(str::to_string))
        .unwrap_or_default();

    engine.exec(
        Deadline::single_row(),
        "INSERT INTO document_content (document_id, body) VALUES (?, ?)",
        &[Value::Text(new_id.to_string()), Value::Text(body)],
    )?;
    Ok(())
}

/// Walk a document's ancestry from itself up to the root, then return it
/// root-first (spec §4.E: "walk parent pointer upward, prepending each
/// parent"). Stops the moment a node reappears rather than looping forever,
/// since a corrupted `parent_id` chain should degrade to a truncated
/// breadcrumb, not a hang.
pub fn breadcrumb(engine: &Engine, id: &str) -> EngineResult<Vec<Row>> {
    let mut trail = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(id.to_string());

    while let Some(node_id) = current {
        if !visited.insert(node_id.clone()) {
            break;
        }
        let row = engine.query(
            Deadline::single_row(),
            "SELECT id, parent_id, title FROM documents WHERE id = ? AND deleted = 0",
            &[Value::Text(node_id.clone())],
        )?;
        let Some(row) = row.into_iter().next() else {
            break;
        };
        current = row.get_str("parent_id").map(str::to_string);
        trail.push(row);
    }
    trail.reverse();
    Ok(trail)
}

/// Find a tag by name, creating it if absent. Races against another caller
/// doing the same are resolved by the table's unique index on `name`: the
/// loser's insert hits a conflict, and it falls back to reading the row the
/// winner created instead of propagating the error.
pub fn get_or_create_tag(engine: &Engine, name: &str) -> EngineResult<String> {
    let existing = engine.query(
        Deadline::single_row(),
        "SELECT id FROM tags WHERE name = ?",
        &[Value::Text(name.to_string())],
    )?;
    if let Some(row) = existing.into_iter().next() {
        return row
            .get_str("id")
            .map(str::to_string)
            .ok_or_else(|| EngineError::backend("tag row missing id"));
    }

    let new_id = uuid::Uuid::new_v4().to_string();
    let insert = engine.exec(
        Deadline::single_row(),
        "INSERT INTO tags (id, name, created) VALUES (?, ?, ?)",
        &[
            Value::Text(new_id.clone()),
            Value::Text(name.to_string()),
            Value::Int(now_epoch()),
        ],
    );

    match insert {
        Ok(_) => Ok(new_id),
        Err(e) if e.kind == helixtrack_core::ErrorKind::Conflict => {
            let row = engine.query_one(
                Deadline::single_row(),
                "SELECT id FROM tags WHERE name = ?",
                &[Value::Text(name.to_string())],
            )?;
            row.get_str("id")
                .map(str::to_string)
                .ok_or_else(|| EngineError::backend("tag row missing id"))
        }
        Err(e) => Err(e),
    }
}

/// A substring search over title and body, most recently created first.
/// Body lives in `document_content`, so a document with no content row
/// still matches on title via the left join.
pub fn search(engine: &Engine, query: &str, limit: i64, offset: i64) -> EngineResult<Vec<Row>> {
    let pattern = format!("%{query}%");
    engine.query(
        Deadline::bulk(),
        "SELECT d.id AS id, d.parent_id AS parent_id, d.title AS title, c.body AS body \
         FROM documents d LEFT JOIN document_content c ON c.document_id = d.id \
         WHERE d.deleted = 0 AND (d.title LIKE ? OR c.body LIKE ?) \
         ORDER BY d.created DESC LIMIT ? OFFSET ?",
        &[
            Value::Text(pattern.clone()),
            Value::Text(pattern),
            Value::Int(limit),
            Value::Int(offset),
        ],
    )
}
