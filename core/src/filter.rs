//! Typed list filters.
//!
//! The donor system applies list filters by runtime type-assertion over a
//! `string -> any` map. Spec §9 calls for replacing that with a small tagged
//! sum over the filter categories the repository actually supports, while
//! preserving the "unknown key silently ignored" policy from spec §4.E.

use std::collections::BTreeMap;

use crate::value::Value;

/// One filterable predicate. New categories are added here, not by
/// widening `Value` with ad-hoc wrapper types.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    StringEquals(String),
    BoolEquals(bool),
    /// Inclusive range over a numeric column. Either bound may be absent.
    Range {
        min: Option<i64>,
        max: Option<i64>,
    },
}

impl FilterValue {
    /// Render as a SQL predicate fragment `"<column> ..."` plus its bind
    /// values, in the order they must be bound.
    pub fn to_sql(&self, column: &str) -> (String, Vec<Value>) {
        match self {
            FilterValue::StringEquals(s) => {
                (format!("{column} = ?"), vec![Value::Text(s.clone())])
            }
            FilterValue::BoolEquals(b) => (format!("{column} = ?"), vec![Value::Bool(*b)]),
            FilterValue::Range { min, max } => {
                let mut clauses = Vec::new();
                let mut binds = Vec::new();
                if let Some(min) = min {
                    clauses.push(format!("{column} >= ?"));
                    binds.push(Value::Int(*min));
                }
                if let Some(max) = max {
                    clauses.push(format!("{column} <= ?"));
                    binds.push(Value::Int(*max));
                }
                if clauses.is_empty() {
                    ("1 = 1".to_string(), Vec::new())
                } else {
                    (clauses.join(" AND "), binds)
                }
            }
        }
    }
}

/// A list of named filters. Keys not recognized by a given repository are
/// silently ignored rather than rejected (spec §4.E).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(BTreeMap<String, FilterValue>);

impl Filters {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a `WHERE` fragment (without the `WHERE` keyword) over only the
    /// keys present in `known_columns`; anything else is dropped.
    pub fn build_where(&self, known_columns: &[&str]) -> (Vec<String>, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();
        for (key, value) in &self.0 {
            if !known_columns.contains(&key.as_str()) {
                continue;
            }
            let (clause, mut values) = value.to_sql(key);
            clauses.push(clause);
            binds.append(&mut values);
        }
        (clauses, binds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_keys_are_silently_dropped() {
        let filters = Filters::new()
            .with("status", FilterValue::StringEquals("open".into()))
            .with("not_a_column", FilterValue::BoolEquals(true));
        let (clauses, binds) = filters.build_where(&["status"]);
        assert_eq!(clauses, vec!["status = ?".to_string()]);
        assert_eq!(binds, vec![Value::Text("open".into())]);
    }

    #[test]
    fn range_filter_with_only_one_bound_emits_one_clause() {
        let filters = Filters::new().with(
            "created",
            FilterValue::Range {
                min: Some(100),
                max: None,
            },
        );
        let (clauses, binds) = filters.build_where(&["created"]);
        assert_eq!(clauses, vec!["created >= ?".to_string()]);
        assert_eq!(binds, vec![Value::Int(100)]);
    }
}
