use crate::entity::EntityResolver;
use crate::graph::GraphResolver;
use crate::retrieval::RetrievalResolver;
use crate::template::TemplateMatcher;
use async_trait::async_trait;
use kotae_core::model::{AnswerMap, MissingSlot, Triple};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which stage of the resolution chain produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Template,
    Retrieval,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReply {
    pub answer: String,
    pub source: AnswerSource,
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub answer: String,
    pub source: AnswerSource,
}

/// One stage of the resolution chain; `None` hands the question to the next
/// stage. Stages swallow backend failures — the chain never errors.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn resolve(&self, query: &str) -> Option<Resolution>;
}

/// Template-driven resolution: match question patterns, fill the missing
/// slot, query the graph per predicate, rank the filled triples by template
/// priority.
pub struct TemplateStrategy {
    matcher: TemplateMatcher,
    entities: EntityResolver,
    graph: GraphResolver,
}

impl TemplateStrategy {
    pub fn new(matcher: TemplateMatcher, entities: EntityResolver, graph: GraphResolver) -> Self {
        Self {
            matcher,
            entities,
            graph,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for TemplateStrategy {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn resolve(&self, query: &str) -> Option<Resolution> {
        let matches = self.matcher.matches(query).await;
        if matches.is_empty() {
            return None;
        }

        let mut resolved: Vec<(i64, Triple, AnswerMap)> = Vec::new();
        for hit in matches {
            let Some(filler) = self
                .entities
                .resolve(&hit.title, hit.template.missing_slot)
                .await
            else {
                debug!(title = %hit.title, "no filler for template candidate");
                continue;
            };

            let triple = match hit.template.missing_slot {
                MissingSlot::Object => {
                    Triple::with_subject(filler, hit.template.predicates.clone())
                }
                MissingSlot::Subject => {
                    Triple::with_object(filler, hit.template.predicates.clone())
                }
            };

            let answer = self.graph.resolve(&triple).await;
            if !answer.is_empty() {
                resolved.push((hit.template.priority, triple, answer));
            }
        }

        // Stable sort: equal priorities keep template retrieval order.
        resolved.sort_by_key(|(priority, ..)| *priority);
        let (_, triple, answer) = resolved.into_iter().next()?;
        Some(Resolution {
            answer: render_answer(triple.known_entity(), &answer),
            source: AnswerSource::Template,
        })
    }
}

/// Pure retrieval resolution, used when template resolution yields nothing.
pub struct RetrievalStrategy {
    retrieval: RetrievalResolver,
}

impl RetrievalStrategy {
    pub fn new(retrieval: RetrievalResolver) -> Self {
        Self { retrieval }
    }
}

#[async_trait]
impl ResolutionStrategy for RetrievalStrategy {
    fn name(&self) -> &'static str {
        "retrieval"
    }

    async fn resolve(&self, query: &str) -> Option<Resolution> {
        self.retrieval.resolve(query).await.map(|answer| Resolution {
            answer,
            source: AnswerSource::Retrieval,
        })
    }
}

pub fn render_answer(entity: &str, answer: &AnswerMap) -> String {
    answer
        .iter()
        .map(|(property, values)| format!("{}--{}:{}", entity, property, values.join(",")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The public entry point: an ordered strategy chain evaluated with
/// short-circuit semantics. Never returns an error; total failure is the
/// empty reply.
pub struct AnswerEngine {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl AnswerEngine {
    pub fn new(template: TemplateStrategy, retrieval: RetrievalStrategy) -> Self {
        Self {
            strategies: vec![Box::new(template), Box::new(retrieval)],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn answer(&self, query: &str) -> AnswerReply {
        let start = Instant::now();
        let normalized = query.trim();
        if normalized.is_empty() {
            warn!("refusing to answer an empty query");
            return AnswerReply {
                answer: String::new(),
                source: AnswerSource::None,
                latency_ms: start.elapsed().as_millis() as u64,
            };
        }

        info!(query = %normalized, "resolution started");
        for strategy in &self.strategies {
            if let Some(resolution) = strategy.resolve(normalized).await {
                info!(strategy = strategy.name(), "resolution finished");
                return AnswerReply {
                    answer: resolution.answer,
                    source: resolution.source,
                    latency_ms: start.elapsed().as_millis() as u64,
                };
            }
            debug!(strategy = strategy.name(), "strategy yielded nothing");
        }

        info!("resolution exhausted every strategy");
        AnswerReply {
            answer: String::new(),
            source: AnswerSource::None,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backends::record;
    use serde_json::json;

    #[test]
    fn render_joins_properties_as_lines() {
        let mut answer = AnswerMap::new();
        answer.absorb_rows(&[
            record(json!({"definition": "过程"})),
            record(json!({"mechanism": ["级联", "反应"]})),
        ]);

        assert_eq!(
            render_answer("细胞凋亡", &answer),
            "细胞凋亡--definition:过程\n细胞凋亡--mechanism:级联,反应"
        );
    }
}
