use async_trait::async_trait;
use kotae_core::error::{ErrorCode, KotaeError};
use kotae_core::model::Record;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Relation linking a node to its equivalent (same-as) nodes.
pub const EQUIVALENT_RELATION: &str = "等同";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph request failed: {0}")]
    Backend(String),
}

impl KotaeError for GraphError {
    fn error_code(&self) -> ErrorCode {
        match self {
            GraphError::Backend(_) => ErrorCode::Unavailable,
        }
    }
}

/// The fixed family of graph pattern queries the resolver dispatches to.
/// `Display` renders the Cypher text; the result-row keys follow the AS
/// aliases in that rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternQuery {
    /// Read one property off a named node. Row key: the property.
    NodeProperty { name: String, property: String },
    /// Follow the same-as relation once, then read the property off the
    /// equivalent nodes. Row key: the property.
    EquivalentNodeProperty { name: String, property: String },
    /// Recover node names from a property value (reverse lookup). Row key:
    /// the property.
    NodeByProperty { property: String, value: String },
    /// Read a property off neighbors linked by the given relation. Row key:
    /// the relation.
    NeighborProperty {
        name: String,
        relation: String,
        property: String,
    },
    /// Names of neighbors linked by the given relation. Row key: `name`.
    NeighborData { name: String, relation: String },
}

fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

impl fmt::Display for PatternQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternQuery::NodeProperty { name, property } => write!(
                f,
                "MATCH (node {{name: '{}'}}) RETURN node.{} AS {}",
                escape_literal(name),
                property,
                property
            ),
            PatternQuery::EquivalentNodeProperty { name, property } => write!(
                f,
                "MATCH (node {{name: '{}'}})-[r:{}]-(equal_node) RETURN equal_node.{} AS {}",
                escape_literal(name),
                EQUIVALENT_RELATION,
                property,
                property
            ),
            PatternQuery::NodeByProperty { property, value } => write!(
                f,
                "MATCH (node {{{}: '{}'}}) RETURN node.name AS {}",
                property,
                escape_literal(value),
                property
            ),
            PatternQuery::NeighborProperty {
                name,
                relation,
                property,
            } => write!(
                f,
                "MATCH (n {{name: '{}'}})-[r:{}]-(neighbors) RETURN neighbors.{} AS {}",
                escape_literal(name),
                relation,
                property,
                relation
            ),
            PatternQuery::NeighborData { name, relation } => write!(
                f,
                "MATCH (n {{name: '{}'}})-[r:{}]-(neighbors) RETURN neighbors.name AS name",
                escape_literal(name),
                relation
            ),
        }
    }
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run(&self, query: &PatternQuery) -> Result<Vec<Record>, GraphError>;
}

/// In-memory property graph interpreting every PatternQuery variant.
/// Relations are undirected, matching the `-[r:X]-` patterns. Immutable
/// once handed to the engine.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: HashMap<String, Record>,
    relations: Vec<(String, String, String)>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, name: impl Into<String>, properties: Record) -> Self {
        self.nodes.insert(name.into(), properties);
        self
    }

    pub fn with_relation(
        mut self,
        from: impl Into<String>,
        relation: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.relations
            .push((from.into(), relation.into(), to.into()));
        self
    }

    fn neighbors(&self, name: &str, relation: &str) -> Vec<&str> {
        self.relations
            .iter()
            .filter(|(_, rel, _)| rel == relation)
            .filter_map(|(from, _, to)| {
                if from == name {
                    Some(to.as_str())
                } else if to == name {
                    Some(from.as_str())
                } else {
                    None
                }
            })
            .collect()
    }

    fn property_row(&self, node: &str, property: &str, key: &str) -> Option<Record> {
        let value = self.nodes.get(node)?.get(property)?;
        if value.is_null() {
            return None;
        }
        let mut row = Record::new();
        row.insert(key.to_string(), value.clone());
        Some(row)
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn run(&self, query: &PatternQuery) -> Result<Vec<Record>, GraphError> {
        let rows = match query {
            PatternQuery::NodeProperty { name, property } => self
                .property_row(name, property, property)
                .into_iter()
                .collect(),
            PatternQuery::EquivalentNodeProperty { name, property } => self
                .neighbors(name, EQUIVALENT_RELATION)
                .into_iter()
                .filter_map(|equal| self.property_row(equal, property, property))
                .collect(),
            PatternQuery::NodeByProperty { property, value } => self
                .nodes
                .iter()
                .filter(|(_, properties)| property_matches(properties, property, value))
                .map(|(name, _)| {
                    let mut row = Record::new();
                    row.insert(property.clone(), Value::String(name.clone()));
                    row
                })
                .collect(),
            PatternQuery::NeighborProperty {
                name,
                relation,
                property,
            } => self
                .neighbors(name, relation)
                .into_iter()
                .filter_map(|neighbor| self.property_row(neighbor, property, relation))
                .collect(),
            PatternQuery::NeighborData { name, relation } => self
                .neighbors(name, relation)
                .into_iter()
                .map(|neighbor| {
                    let mut row = Record::new();
                    row.insert("name".to_string(), Value::String(neighbor.to_string()));
                    row
                })
                .collect(),
        };
        Ok(rows)
    }
}

fn property_matches(properties: &Record, property: &str, value: &str) -> bool {
    match properties.get(property) {
        Some(Value::String(stored)) => stored == value,
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| item.as_str().map(|s| s == value).unwrap_or(false)),
        _ => false,
    }
}
