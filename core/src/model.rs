use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key-value row returned by the document index or the graph store.
pub type Record = BTreeMap<String, Value>;

/// Which slot of a triple a question template leaves unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSlot {
    Subject,
    Object,
}

/// A knowledge-graph fact with at most one of subject/object unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: Vec<String>,
    pub object: String,
}

impl Triple {
    pub fn with_subject(subject: impl Into<String>, predicate: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: String::new(),
        }
    }

    pub fn with_object(object: impl Into<String>, predicate: Vec<String>) -> Self {
        Self {
            subject: String::new(),
            predicate,
            object: object.into(),
        }
    }

    /// The slot that was known or resolved; used as the answer's entity label.
    pub fn known_entity(&self) -> &str {
        if !self.subject.is_empty() {
            &self.subject
        } else {
            &self.object
        }
    }
}

/// Whether a predicate is a scalar property of a node or a link to another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateKind {
    Data,
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateMeta {
    pub uri: String,
    pub kind: PredicateKind,
}

/// A retrieval candidate annotated with its ranking score and the token count
/// of the matched field. Lives only for the duration of one resolution call.
#[derive(Debug, Clone)]
pub struct CandidateDoc {
    pub doc: Record,
    pub score: f32,
    pub length: usize,
}

/// Property name -> ordered values, merged across graph result rows.
///
/// Backed by a BTreeMap so rendering order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMap(BTreeMap<String, Vec<String>>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Fold result rows into the map. List values extend the entry, scalar
    /// values append to it, empty/null values are skipped for that key.
    pub fn absorb_rows(&mut self, rows: &[Record]) {
        for row in rows {
            for (key, value) in row {
                match value {
                    Value::Array(items) => {
                        let rendered: Vec<String> =
                            items.iter().filter_map(value_text).collect();
                        if !rendered.is_empty() {
                            self.0.entry(key.clone()).or_default().extend(rendered);
                        }
                    }
                    other => {
                        if let Some(text) = value_text(other) {
                            self.0.entry(key.clone()).or_default().push(text);
                        }
                    }
                }
            }
        }
    }

    /// Key-union merge: entries from `other` extend existing ones, never
    /// overwrite. Used when one triple carries several predicates.
    pub fn merge(&mut self, other: AnswerMap) {
        for (key, values) in other.0 {
            self.0.entry(key).or_default().extend(values);
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
