use crate::scorer::similarity_from_distance;
use backends::IndexClient;
use kotae_core::config::ResolverConfig;
use kotae_core::error::KotaeError;
use kotae_core::model::{CandidateDoc, Record};
use nlu::{Segmenter, WordVectors};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

const TRIPLE_OBJECT_FIELD: &str = "triple_object";
const TRIPLE_OBJECT_INDEX_FIELD: &str = "triple_object_index";

/// Free-text fallback: no template, no graph query. Retrieves triple records
/// by the question's tokens, scores them by word-mover similarity against the
/// object index field, and returns the top record's stored object verbatim.
pub struct RetrievalResolver {
    triples: IndexClient,
    segmenter: Arc<dyn Segmenter>,
    word_vectors: Arc<dyn WordVectors>,
    config: ResolverConfig,
}

impl RetrievalResolver {
    pub fn new(
        triples: IndexClient,
        segmenter: Arc<dyn Segmenter>,
        word_vectors: Arc<dyn WordVectors>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            triples,
            segmenter,
            word_vectors,
            config,
        }
    }

    pub async fn resolve(&self, query: &str) -> Option<String> {
        let docs = match self
            .triples
            .search_seg(query, &[TRIPLE_OBJECT_INDEX_FIELD], None)
            .await
        {
            Ok(docs) => docs,
            Err(err) => {
                warn!(code = %err.error_code(), error = %err, "fallback retrieval failed");
                return None;
            }
        };
        if docs.is_empty() {
            debug!("fallback retrieval found no candidates");
            return None;
        }

        let ranked = self.rank(query, docs);
        ranked
            .first()
            .and_then(|candidate| candidate.doc.get(TRIPLE_OBJECT_FIELD))
            .and_then(Value::as_str)
            .filter(|answer| !answer.is_empty())
            .map(str::to_string)
    }

    fn rank(&self, query: &str, docs: Vec<Record>) -> Vec<CandidateDoc> {
        let query_words = self.segmenter.words(query);
        let mut survivors = Vec::new();

        for doc in docs {
            let indexed = doc
                .get(TRIPLE_OBJECT_INDEX_FIELD)
                .and_then(Value::as_str)
                .unwrap_or("");
            let doc_words: Vec<String> =
                indexed.split_whitespace().map(str::to_string).collect();
            if doc_words.is_empty() {
                continue;
            }

            let distance = self.word_vectors.distance(&query_words, &doc_words);
            let score = similarity_from_distance(distance, self.config.similarity_decay);
            if score > self.config.similarity_threshold {
                survivors.push(CandidateDoc {
                    doc,
                    score,
                    length: doc_words.len(),
                });
            }
        }

        survivors.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        survivors
    }
}
