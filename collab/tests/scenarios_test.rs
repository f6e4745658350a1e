use std::sync::Arc;
use std::thread;

use helixtrack_core::{BackendConfig, EngineResult, ErrorKind, FileBackendConfig, Filters, PoolConfig};
use helixtrack_storage::Engine;

use helixtrack_collab::locks::{EntityLockRegistry, LockType};
use helixtrack_collab::repository::Repository;
use helixtrack_collab::schema;
use helixtrack_collab::special_ops;
use helixtrack_collab::ticket::Ticket;

fn open_engine() -> Engine {
    let engine = Engine::open(
        BackendConfig::File(FileBackendConfig {
            path: ":memory:".into(),
            ..Default::default()
        }),
        PoolConfig {
            max_open: 8,
            max_idle: 8,
            ..Default::default()
        },
    )
    .unwrap();
    engine
        .exec(helixtrack_core::Deadline::bulk(), schema::TICKETS_DDL, &[])
        .unwrap();
    engine
        .exec(helixtrack_core::Deadline::bulk(), schema::TICKET_HISTORY_DDL, &[])
        .unwrap();
    engine
        .exec(helixtrack_core::Deadline::bulk(), schema::ENTITY_LOCKS_DDL, &[])
        .unwrap();
    engine
        .exec(helixtrack_core::Deadline::bulk(), schema::DOCUMENTS_DDL, &[])
        .unwrap();
    engine
        .exec(helixtrack_core::Deadline::bulk(), schema::DOCUMENT_CONTENT_DDL, &[])
        .unwrap();
    engine
        .exec(helixtrack_core::Deadline::bulk(), schema::TAGS_DDL, &[])
        .unwrap();
    engine
}

fn insert_document(engine: &Engine, id: &str, parent_id: Option<&str>, title: &str) {
    engine
        .exec(
            helixtrack_core::Deadline::single_row(),
            "INSERT INTO documents (id, parent_id, title, status, version, created, deleted) \
             VALUES (?, ?, ?, 'draft', 1, ?, 0)",
            &[
                helixtrack_core::Value::Text(id.into()),
                parent_id
                    .map(|p| helixtrack_core::Value::Text(p.into()))
                    .unwrap_or(helixtrack_core::Value::Null),
                helixtrack_core::Value::Text(title.into()),
                helixtrack_core::Value::Int(0),
            ],
        )
        .unwrap();
}

fn new_ticket(id: &str, title: &str) -> Ticket {
    Ticket::new(id, title)
}

#[test]
fn optimistic_lock_conflict_is_reported_with_a_stable_kind() {
    let engine = open_engine();
    let repo: Repository<Ticket> = Repository::new(&engine);

    let created = repo.create(new_ticket("t1", "fix parser"), "alice").unwrap();
    assert_eq!(created.version, 1);

    let first_read = repo.read("t1").unwrap();
    let second_read = repo.read("t1").unwrap();

    let mut updated_first = first_read.clone();
    updated_first.status = "in_progress".to_string();
    repo.update(updated_first, "alice").unwrap();

    let mut updated_second = second_read;
    updated_second.status = "closed".to_string();
    let err = repo.update(updated_second, "bob").unwrap_err();
    assert_eq!(err.kind, ErrorKind::VersionConflict);

    let final_row = repo.read("t1").unwrap();
    assert_eq!(final_row.version, 2);
    assert_eq!(final_row.status, "in_progress");
}

#[test]
fn get_or_create_tag_under_contention_yields_one_row() {
    let engine = Arc::new(open_engine());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            special_ops::get_or_create_tag(&engine, "backend").unwrap()
        }));
    }
    let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &ids[0];
    assert!(ids.iter().all(|id| id == first));

    let rows = engine
        .query(
            helixtrack_core::Deadline::single_row(),
            "SELECT id FROM tags WHERE name = ?",
            &[helixtrack_core::Value::Text("backend".into())],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn duplicate_document_is_best_effort() {
    let engine = open_engine();
    insert_document(&engine, "doc1", None, "spec");
    engine
        .exec(
            helixtrack_core::Deadline::single_row(),
            "INSERT INTO document_content (document_id, body) VALUES (?, ?)",
            &[
                helixtrack_core::Value::Text("doc1".into()),
                helixtrack_core::Value::Text("body text".into()),
            ],
        )
        .unwrap();

    special_ops::duplicate_document(&engine, "doc1", "doc2").unwrap();
    let rows = engine
        .query(
            helixtrack_core::Deadline::single_row(),
            "SELECT title, status, version FROM documents WHERE id = ?",
            &[helixtrack_core::Value::Text("doc2".into())],
        )
        .unwrap();
    assert_eq!(rows[0].get_str("title"), Some("spec (copy)"));
    assert_eq!(rows[0].get_str("status"), Some("draft"));
    assert_eq!(rows[0].get_i64("version"), Some(1));

    let content = engine
        .query(
            helixtrack_core::Deadline::single_row(),
            "SELECT body FROM document_content WHERE document_id = ?",
            &[helixtrack_core::Value::Text("doc2".into())],
        )
        .unwrap();
    assert_eq!(content[0].get_str("body"), Some("body text"));

    let err = special_ops::duplicate_document(&engine, "missing", "doc3").unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn duplicate_document_core_row_survives_missing_content() {
    let engine = open_engine();
    insert_document(&engine, "doc1", None, "spec");

    special_ops::duplicate_document(&engine, "doc1", "doc2").unwrap();

    let rows = engine
        .query(
            helixtrack_core::Deadline::single_row(),
            "SELECT title, status, version FROM documents WHERE id = ?",
            &[helixtrack_core::Value::Text("doc2".into())],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_str("title"), Some("spec (copy)"));
    assert_eq!(rows[0].get_str("status"), Some("draft"));
    assert_eq!(rows[0].get_i64("version"), Some(1));

    let content = engine
        .query(
            helixtrack_core::Deadline::single_row(),
            "SELECT body FROM document_content WHERE document_id = ?",
            &[helixtrack_core::Value::Text("doc2".into())],
        )
        .unwrap();
    assert_eq!(content[0].get_str("body"), Some(""));
}

#[test]
fn breadcrumb_is_root_first() {
    let engine = open_engine();
    insert_document(&engine, "root", None, "root");
    insert_document(&engine, "child", Some("root"), "child");
    insert_document(&engine, "grandchild", Some("child"), "grandchild");

    let trail = special_ops::breadcrumb(&engine, "grandchild").unwrap();
    let titles: Vec<&str> = trail.iter().map(|r| r.get_str("title").unwrap()).collect();
    assert_eq!(titles, vec!["root", "child", "grandchild"]);
}

#[test]
fn soft_delete_is_idempotent_and_bumps_version() {
    let engine = open_engine();
    let repo: Repository<Ticket> = Repository::new(&engine);

    let created = repo.create(new_ticket("t6", "flaky test"), "alice").unwrap();
    assert_eq!(created.version, 1);

    repo.soft_delete("t6", "alice").unwrap();
    let err = repo.read("t6").unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let history = repo.get_history("t6").unwrap();
    let mut versions: Vec<i64> = history.iter().map(|h| h.version).collect();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2]);

    let second = repo.soft_delete("t6", "alice").unwrap_err();
    assert_eq!(second.kind, ErrorKind::NotFound);
}

#[test]
fn history_stays_contiguous_after_restore_version() {
    let engine = open_engine();
    let repo: Repository<Ticket> = Repository::new(&engine);

    let mut ticket = repo.create(new_ticket("t2", "initial"), "alice").unwrap();
    for i in 0..4 {
        ticket.status = format!("status-{i}");
        ticket = repo.update(ticket, "alice").unwrap();
    }
    assert_eq!(ticket.version, 5);

    let restored = repo.restore_version("t2", 2, "alice").unwrap();
    assert_eq!(restored.version, 6);

    let history = repo.get_history("t2").unwrap();
    let mut versions: Vec<i64> = history.iter().map(|h| h.version).collect();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(history[0].version, 6);
}

#[test]
fn pessimistic_lock_blocks_update_until_released() -> EngineResult<()> {
    let engine = open_engine();
    let repo: Repository<Ticket> = Repository::new(&engine);
    let locks = EntityLockRegistry::new(&engine);

    let created = repo.create(new_ticket("t3", "investigate outage"), "alice")?;
    locks.acquire("tickets", "t3", "alice", LockType::Pessimistic, None)?;

    let mut attempt = created.clone();
    attempt.status = "closed".to_string();
    let err = repo.update(attempt.clone(), "bob").unwrap_err();
    assert_eq!(err.kind, ErrorKind::LockHeld);

    locks.release("tickets", "t3", "alice")?;
    let updated = repo.update(attempt, "bob")?;
    assert_eq!(updated.status, "closed");
    Ok(())
}

#[test]
fn unknown_filter_keys_do_not_affect_listing() {
    let engine = open_engine();
    let repo: Repository<Ticket> = Repository::new(&engine);
    repo.create(new_ticket("t4", "a"), "alice").unwrap();
    repo.create(new_ticket("t5", "b"), "alice").unwrap();

    let filters = Filters::new().with("not_a_real_column", helixtrack_core::FilterValue::BoolEquals(true));
    let rows = repo.list(&filters, 10, 0).unwrap();
    assert_eq!(rows.len(), 2);
}
