use async_trait::async_trait;
use kotae_core::error::{ErrorCode, KotaeError};
use kotae_core::model::{PredicateKind, PredicateMeta};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("predicate catalog request failed: {0}")]
    Backend(String),
}

impl KotaeError for CatalogError {
    fn error_code(&self) -> ErrorCode {
        match self {
            CatalogError::Backend(_) => ErrorCode::Unavailable,
        }
    }
}

/// Relationship-kind lookup for predicate identifiers. The resolver never
/// infers a kind locally; predicates absent from the catalog are skipped.
#[async_trait]
pub trait PredicateCatalog: Send + Sync {
    async fn lookup(&self, uris: &[String]) -> Result<Vec<PredicateMeta>, CatalogError>;
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: HashMap<String, PredicateKind>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predicate(mut self, uri: impl Into<String>, kind: PredicateKind) -> Self {
        self.entries.insert(uri.into(), kind);
        self
    }
}

#[async_trait]
impl PredicateCatalog for MemoryCatalog {
    async fn lookup(&self, uris: &[String]) -> Result<Vec<PredicateMeta>, CatalogError> {
        Ok(uris
            .iter()
            .filter_map(|uri| {
                self.entries.get(uri).map(|kind| PredicateMeta {
                    uri: uri.clone(),
                    kind: *kind,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_preserves_request_order_and_skips_unknown() {
        let catalog = MemoryCatalog::new()
            .with_predicate("BIOLOGY_MECHANISM", PredicateKind::Data)
            .with_predicate("COMMON_CONSISTEDOF", PredicateKind::Object);

        let metas = catalog
            .lookup(&[
                "COMMON_CONSISTEDOF".to_string(),
                "UNKNOWN".to_string(),
                "BIOLOGY_MECHANISM".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].uri, "COMMON_CONSISTEDOF");
        assert_eq!(metas[0].kind, PredicateKind::Object);
        assert_eq!(metas[1].uri, "BIOLOGY_MECHANISM");
        assert_eq!(metas[1].kind, PredicateKind::Data);
    }
}
