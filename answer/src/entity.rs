use crate::scorer::{lcs_ratio, similarity_from_distance};
use backends::{FieldFilter, IndexClient};
use kotae_core::config::ResolverConfig;
use kotae_core::error::KotaeError;
use kotae_core::model::{CandidateDoc, MissingSlot, Record};
use kotae_core::synonym::SynonymTable;
use nlu::{Segmenter, WordVectors};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const TRIPLE_SUBJECT_FIELD: &str = "triple_subject";
const TRIPLE_OBJECT_FIELD: &str = "triple_object";
const TRIPLE_SUBJECT_INDEX_FIELD: &str = "triple_subject_index";
const ATTRIBUTE_NAME_FIELD: &str = "attribute_name";
const ATTRIBUTE_NAME_VALUE: &str = "name";

/// Fills the missing slot of a partial triple from index candidates.
///
/// Subject candidates are scored structurally (LCS ratio, synonym-expanded,
/// full matches only by default) and broken by indexed-field length — longer
/// subjects are more specific. Object candidates are scored fuzzily by
/// word-mover similarity.
pub struct EntityResolver {
    triples: IndexClient,
    segmenter: Arc<dyn Segmenter>,
    word_vectors: Arc<dyn WordVectors>,
    synonyms: Arc<SynonymTable>,
    config: ResolverConfig,
}

impl EntityResolver {
    pub fn new(
        triples: IndexClient,
        segmenter: Arc<dyn Segmenter>,
        word_vectors: Arc<dyn WordVectors>,
        synonyms: Arc<SynonymTable>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            triples,
            segmenter,
            word_vectors,
            synonyms,
            config,
        }
    }

    /// Resolve the filler literal for the slot the template left open.
    /// `None` is a valid no-match outcome, aborting only this candidate.
    pub async fn resolve(&self, title: &str, missing: MissingSlot) -> Option<String> {
        let (target_field, filter) = match missing {
            // Subject wanted: restrict to records carrying the entity name.
            MissingSlot::Object => (
                TRIPLE_SUBJECT_FIELD,
                Some(FieldFilter::new(ATTRIBUTE_NAME_FIELD, ATTRIBUTE_NAME_VALUE)),
            ),
            MissingSlot::Subject => (TRIPLE_OBJECT_FIELD, None),
        };

        let docs = match self
            .triples
            .search_seg(title, &[TRIPLE_SUBJECT_INDEX_FIELD], filter)
            .await
        {
            Ok(docs) => docs,
            Err(err) => {
                warn!(code = %err.error_code(), error = %err, "triple retrieval failed");
                return None;
            }
        };
        if docs.is_empty() {
            debug!(title = %title, "no triple candidates retrieved");
            return None;
        }

        let ranked = match missing {
            MissingSlot::Object => self.rank_by_subject(title, docs),
            MissingSlot::Subject => self.rank_by_object(title, docs),
        };

        let filler = ranked
            .first()
            .and_then(|candidate| candidate.doc.get(target_field))
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        debug!(title = %title, filler = ?filler, "entity resolution finished");
        filler
    }

    /// Structural scoring: LCS ratio of the title against the candidate's
    /// indexed field, taking the best over the literal's synonym expansions.
    /// Survivors sort by indexed-field length descending.
    fn rank_by_subject(&self, title: &str, docs: Vec<Record>) -> Vec<CandidateDoc> {
        let title_words = self.segmenter.words(title);
        let mut memo: HashMap<String, (f32, usize)> = HashMap::new();
        let mut survivors = Vec::new();

        for doc in docs {
            let indexed = doc
                .get(TRIPLE_SUBJECT_INDEX_FIELD)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let doc_words: Vec<String> =
                indexed.split_whitespace().map(str::to_string).collect();
            if doc_words.is_empty() {
                continue;
            }

            let cached = memo.get(&indexed).copied();
            let (score, length) = match cached {
                Some(entry) => entry,
                None => {
                    let mut score = lcs_ratio(&title_words, &doc_words);
                    let literal = doc
                        .get(TRIPLE_SUBJECT_FIELD)
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    for alternate in self.synonyms.expand(literal) {
                        let alternate_words = self.segmenter.words(alternate);
                        if alternate_words.is_empty() {
                            continue;
                        }
                        score = score.max(lcs_ratio(&title_words, &alternate_words));
                    }
                    let entry = (score, doc_words.len());
                    memo.insert(indexed, entry);
                    entry
                }
            };

            if score >= self.config.subject_match_threshold {
                survivors.push(CandidateDoc { doc, score, length });
            }
        }

        survivors.sort_by(|a, b| b.length.cmp(&a.length));
        survivors
    }

    /// Fuzzy scoring: word-mover similarity of the title against the
    /// candidate's indexed field, descending.
    fn rank_by_object(&self, title: &str, docs: Vec<Record>) -> Vec<CandidateDoc> {
        let title_words = self.segmenter.words(title);
        let mut memo: HashMap<String, f32> = HashMap::new();
        let mut survivors = Vec::new();

        for doc in docs {
            let indexed = doc
                .get(TRIPLE_SUBJECT_INDEX_FIELD)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let doc_words: Vec<String> =
                indexed.split_whitespace().map(str::to_string).collect();
            if doc_words.is_empty() {
                continue;
            }

            let length = doc_words.len();
            let cached = memo.get(&indexed).copied();
            let score = match cached {
                Some(score) => score,
                None => {
                    let distance = self.word_vectors.distance(&title_words, &doc_words);
                    let score =
                        similarity_from_distance(distance, self.config.similarity_decay);
                    memo.insert(indexed, score);
                    score
                }
            };

            if score > self.config.similarity_threshold {
                survivors.push(CandidateDoc { doc, score, length });
            }
        }

        survivors.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        survivors
    }
}
