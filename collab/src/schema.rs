//! Table DDL for the entities and bookkeeping tables this crate owns.
//!
//! Migration execution itself is out of scope (spec non-goals); callers run
//! this against a freshly opened [`helixtrack_storage::Engine`] however their
//! deployment already runs schema changes. Kept as one batch per spec §6's
//! index requirements: foreign keys, `deleted`, the ordering timestamp, and
//! `(entity_id, version)` on every history table.

pub const TICKETS_DDL: &str = "
CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    priority INTEGER NOT NULL,
    assignee TEXT,
    version INTEGER NOT NULL,
    created INTEGER NOT NULL,
    modified INTEGER NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_tickets_deleted ON tickets (deleted);
CREATE INDEX IF NOT EXISTS idx_tickets_created ON tickets (created);
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets (status);
";

pub const TICKET_HISTORY_DDL: &str = "
CREATE TABLE IF NOT EXISTS ticket_history (
    id TEXT PRIMARY KEY,
    entity_id TEXT NOT NULL REFERENCES tickets (id),
    version INTEGER NOT NULL,
    action TEXT NOT NULL,
    change_summary TEXT,
    old_data TEXT,
    new_data TEXT,
    conflict_data TEXT,
    changed_by TEXT NOT NULL,
    created INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_ticket_history_entity_version
    ON ticket_history (entity_id, version);
CREATE INDEX IF NOT EXISTS idx_ticket_history_created ON ticket_history (created);
";

pub const ENTITY_LOCKS_DDL: &str = "
CREATE TABLE IF NOT EXISTS entity_locks (
    id TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    lock_type TEXT NOT NULL,
    acquired_at INTEGER NOT NULL,
    expires_at INTEGER
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_entity_locks_holder
    ON entity_locks (entity_type, entity_id, user_id);
CREATE INDEX IF NOT EXISTS idx_entity_locks_entity
    ON entity_locks (entity_type, entity_id);
";

/// A generic document table used by the special-operations tests (duplicate,
/// breadcrumb, search) — none of the reference entities need hierarchy or
/// free-text columns, so these operations are exercised against a minimal
/// table shaped for exactly that. Core fields (this table) and content
/// (`document_content`) are split across two tables on purpose: duplication
/// must succeed from the core fields alone even when the content copy fails
/// (spec §4.E).
pub const DOCUMENTS_DDL: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    parent_id TEXT REFERENCES documents (id),
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    version INTEGER NOT NULL DEFAULT 1,
    created INTEGER NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents (parent_id);
CREATE INDEX IF NOT EXISTS idx_documents_deleted ON documents (deleted);
";

pub const DOCUMENT_CONTENT_DDL: &str = "
CREATE TABLE IF NOT EXISTS document_content (
    document_id TEXT PRIMARY KEY REFERENCES documents (id),
    body TEXT NOT NULL
);
";

pub const TAGS_DDL: &str = "
CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_name ON tags (name);
";
