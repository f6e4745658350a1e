//! The reference versioned entity used to exercise and test the generic
//! repository, optimistic-lock write path, history recorder and lock
//! registry. Stands in for the tracker's ticket/project/comment/board
//! family, all of which share this exact row shape.

use helixtrack_core::{Entity, EngineError, EngineResult, Row, Value, VersionedEntity};

#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: i64,
    pub assignee: Option<String>,
    pub version: i64,
    pub created: i64,
    pub modified: i64,
    pub deleted: bool,
}

impl Ticket {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: "open".to_string(),
            priority: 3,
            assignee: None,
            version: 0,
            created: 0,
            modified: 0,
            deleted: false,
        }
    }
}

impl Entity for Ticket {
    fn table_name() -> &'static str {
        "tickets"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "title",
            "description",
            "status",
            "priority",
            "assignee",
            "version",
            "created",
            "modified",
            "deleted",
        ]
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> i64 {
        self.created
    }

    fn set_created(&mut self, value: i64) {
        self.created = value;
    }

    fn modified(&self) -> i64 {
        self.modified
    }

    fn set_modified(&mut self, value: i64) {
        self.modified = value;
    }

    fn deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, value: bool) {
        self.deleted = value;
    }

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if !(1..=5).contains(&self.priority) {
            return Err("priority must be between 1 and 5".to_string());
        }
        Ok(())
    }

    fn scan_row(row: &Row) -> EngineResult<Self> {
        Ok(Ticket {
            id: row
                .get_str("id")
                .ok_or_else(|| EngineError::backend("ticket row missing id"))?
                .to_string(),
            title: row
                .get_str("title")
                .ok_or_else(|| EngineError::backend("ticket row missing title"))?
                .to_string(),
            description: row.get_str("description").unwrap_or_default().to_string(),
            status: row
                .get_str("status")
                .ok_or_else(|| EngineError::backend("ticket row missing status"))?
                .to_string(),
            priority: row
                .get_i64("priority")
                .ok_or_else(|| EngineError::backend("ticket row missing priority"))?,
            assignee: row.get_str("assignee").map(str::to_string),
            version: row
                .get_i64("version")
                .ok_or_else(|| EngineError::backend("ticket row missing version"))?,
            created: row
                .get_i64("created")
                .ok_or_else(|| EngineError::backend("ticket row missing created"))?,
            modified: row
                .get_i64("modified")
                .ok_or_else(|| EngineError::backend("ticket row missing modified"))?,
            deleted: row.get_bool("deleted").unwrap_or(false),
        })
    }

    fn bind_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
            Value::Text(self.status.clone()),
            Value::Int(self.priority),
            self.assignee.clone().into(),
            Value::Int(self.version),
            Value::Int(self.created),
            Value::Int(self.modified),
            Value::Bool(self.deleted),
        ]
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "status": self.status,
            "priority": self.priority,
            "assignee": self.assignee,
            "version": self.version,
            "created": self.created,
            "modified": self.modified,
            "deleted": self.deleted,
        })
    }
}

impl VersionedEntity for Ticket {
    fn history_table_name() -> &'static str {
        "ticket_history"
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, value: i64) {
        self.version = value;
    }
}
