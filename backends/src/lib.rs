pub mod catalog;
pub mod graph;
pub mod index;

pub use catalog::{CatalogError, MemoryCatalog, PredicateCatalog};
pub use graph::{GraphError, GraphStore, MemoryGraph, PatternQuery};
pub use index::{DocumentIndex, FieldFilter, IndexClient, IndexError, IndexQuery, MemoryIndex};

use kotae_core::model::Record;

/// Build a Record from a JSON object literal; panics on non-objects, so it is
/// meant for fixtures and seed data.
pub fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).expect("record seed must be a JSON object")
}
