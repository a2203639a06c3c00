use backends::{GraphStore, PatternQuery, PredicateCatalog};
use kotae_core::error::KotaeError;
use kotae_core::model::{AnswerMap, PredicateKind, Triple};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Neighbor property read by object-kind predicates unless overridden.
pub const DEFAULT_QUERY_PROPERTY: &str = "name";

/// Dispatches a filled triple to the graph query matching each predicate's
/// relationship kind and folds the rows into one AnswerMap.
pub struct GraphResolver {
    graph: Arc<dyn GraphStore>,
    catalog: Arc<dyn PredicateCatalog>,
}

impl GraphResolver {
    pub fn new(graph: Arc<dyn GraphStore>, catalog: Arc<dyn PredicateCatalog>) -> Self {
        Self { graph, catalog }
    }

    pub async fn resolve(&self, triple: &Triple) -> AnswerMap {
        self.resolve_with_property(triple, DEFAULT_QUERY_PROPERTY)
            .await
    }

    pub async fn resolve_with_property(
        &self,
        triple: &Triple,
        query_property: &str,
    ) -> AnswerMap {
        let mut answer = AnswerMap::new();
        if triple.predicate.is_empty() {
            warn!("triple has no predicates to dispatch");
            return answer;
        }

        let metas = match self.catalog.lookup(&triple.predicate).await {
            Ok(metas) => metas,
            Err(err) => {
                error!(code = %err.error_code(), error = %err, "predicate lookup failed");
                return answer;
            }
        };
        if metas.is_empty() {
            warn!(predicates = ?triple.predicate, "no predicate metadata resolved");
            return answer;
        }

        for meta in metas {
            let partial = match meta.kind {
                PredicateKind::Data => self.resolve_data(triple, &meta.uri).await,
                PredicateKind::Object => {
                    self.resolve_object(triple, &meta.uri, query_property).await
                }
            };
            answer.merge(partial);
        }
        answer
    }

    async fn resolve_data(&self, triple: &Triple, predicate: &str) -> AnswerMap {
        if !triple.subject.is_empty() {
            let primary = self
                .run_normalized(PatternQuery::NodeProperty {
                    name: triple.subject.clone(),
                    property: predicate.to_string(),
                })
                .await;
            if !primary.is_empty() {
                return primary;
            }
            // Mandatory second attempt through the same-as relation.
            debug!(subject = %triple.subject, "direct read empty, trying equivalent nodes");
            return self
                .run_normalized(PatternQuery::EquivalentNodeProperty {
                    name: triple.subject.clone(),
                    property: predicate.to_string(),
                })
                .await;
        }

        if !triple.object.is_empty() {
            return self
                .run_normalized(PatternQuery::NodeByProperty {
                    property: predicate.to_string(),
                    value: triple.object.clone(),
                })
                .await;
        }

        warn!(predicate = %predicate, "triple has neither subject nor object");
        AnswerMap::new()
    }

    async fn resolve_object(
        &self,
        triple: &Triple,
        predicate: &str,
        query_property: &str,
    ) -> AnswerMap {
        if !triple.subject.is_empty() {
            let query = if query_property == DEFAULT_QUERY_PROPERTY {
                PatternQuery::NeighborData {
                    name: triple.subject.clone(),
                    relation: predicate.to_string(),
                }
            } else {
                PatternQuery::NeighborProperty {
                    name: triple.subject.clone(),
                    relation: predicate.to_string(),
                    property: query_property.to_string(),
                }
            };
            return self.run_normalized(query).await;
        }

        // Reversing an object relation from its target is not expressible
        // over the fixed query family.
        debug!(predicate = %predicate, "object-kind predicate with only the object known");
        AnswerMap::new()
    }

    async fn run_normalized(&self, query: PatternQuery) -> AnswerMap {
        debug!(query = %query, "graph query");
        match self.graph.run(&query).await {
            Ok(rows) => {
                let mut map = AnswerMap::new();
                map.absorb_rows(&rows);
                map
            }
            Err(err) => {
                error!(code = %err.error_code(), error = %err, query = %query, "graph query failed");
                AnswerMap::new()
            }
        }
    }
}
