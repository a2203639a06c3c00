use async_trait::async_trait;
use kotae_core::error::{ErrorCode, KotaeError};
use kotae_core::model::Record;
use nlu::Segmenter;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Lucene metacharacter handling: most are backslash-escaped, grouping and
/// field-separator characters are stripped outright.
const ESCAPE_TABLE: [(&str, &str); 10] = [
    ("\\", "\\\\"),
    ("+", "\\+"),
    ("!", "\\!"),
    ("/", "\\/"),
    ("^", "\\^"),
    ("-", "\\-"),
    ("~", "\\~"),
    (":", ""),
    ("(", ""),
    (")", ""),
];

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index request failed: {0}")]
    Backend(String),
    #[error("no usable terms after segmentation and escaping")]
    EmptyTerms,
}

impl KotaeError for IndexError {
    fn error_code(&self) -> ErrorCode {
        match self {
            IndexError::Backend(_) => ErrorCode::Unavailable,
            IndexError::EmptyTerms => ErrorCode::InvalidArgument,
        }
    }
}

pub fn escape_term(term: &str) -> String {
    let mut escaped = term.to_string();
    for (from, to) in ESCAPE_TABLE {
        escaped = escaped.replace(from, to);
    }
    escaped
}

/// Structural restriction appended to a query, e.g. only records whose
/// attribute name is `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A parsed index query: OR of terms within each field, AND across fields,
/// plus an optional field-equality filter and a result-count cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub terms: Vec<String>,
    pub fields: Vec<String>,
    pub rows: usize,
    pub filter: Option<FieldFilter>,
}

impl IndexQuery {
    /// Render the Solr-style query string; used in debug logs and to talk to
    /// a text-protocol backend.
    pub fn render(&self) -> String {
        let clauses: Vec<String> = if self.fields.is_empty() {
            vec![format!(
                "({})",
                self.terms
                    .iter()
                    .map(|term| format!("*:{}", term))
                    .collect::<Vec<_>>()
                    .join(" ")
            )]
        } else {
            self.fields
                .iter()
                .map(|field| {
                    format!(
                        "({})",
                        self.terms
                            .iter()
                            .map(|term| format!("{}:{}", field, term))
                            .collect::<Vec<_>>()
                            .join(" ")
                    )
                })
                .collect()
        };

        let mut rendered = format!("+({})", clauses.join(" "));
        if let Some(filter) = &self.filter {
            rendered.push_str(&format!(" +({}:{})", filter.field, filter.value));
        }
        rendered
    }
}

#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn search(&self, query: &IndexQuery) -> Result<Vec<Record>, IndexError>;
}

/// Client-side query construction over a raw document index: segments the
/// sentence, escapes the terms, builds the field clauses, issues the search.
pub struct IndexClient {
    collection: String,
    backend: Arc<dyn DocumentIndex>,
    segmenter: Arc<dyn Segmenter>,
    rows: usize,
}

impl IndexClient {
    pub fn new(
        collection: impl Into<String>,
        backend: Arc<dyn DocumentIndex>,
        segmenter: Arc<dyn Segmenter>,
        rows: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            backend,
            segmenter,
            rows,
        }
    }

    /// Segment a sentence into search tokens and query the given fields.
    pub async fn search_seg(
        &self,
        sentence: &str,
        fields: &[&str],
        filter: Option<FieldFilter>,
    ) -> Result<Vec<Record>, IndexError> {
        let terms: Vec<String> = self
            .segmenter
            .seg_for_search(sentence)
            .iter()
            .map(|word| escape_term(word.trim()))
            .filter(|word| !word.is_empty())
            .collect();
        self.search_terms(terms, fields, filter).await
    }

    pub async fn search_terms(
        &self,
        terms: Vec<String>,
        fields: &[&str],
        filter: Option<FieldFilter>,
    ) -> Result<Vec<Record>, IndexError> {
        if terms.is_empty() {
            warn!(collection = %self.collection, "refusing to search with no terms");
            return Err(IndexError::EmptyTerms);
        }

        let query = IndexQuery {
            terms,
            fields: fields.iter().map(|field| field.to_string()).collect(),
            rows: self.rows,
            filter,
        };
        debug!(collection = %self.collection, query = %query.render(), "index search");
        self.backend.search(&query).await
    }
}

/// In-memory reference backend: a document matches when every field clause
/// has at least one term hit; relevance is the total hit count. Immutable
/// after construction, so it is freely shared across concurrent readers.
pub struct MemoryIndex {
    docs: Vec<Record>,
}

impl MemoryIndex {
    pub fn new(docs: Vec<Record>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl DocumentIndex for MemoryIndex {
    async fn search(&self, query: &IndexQuery) -> Result<Vec<Record>, IndexError> {
        let mut scored: Vec<(usize, &Record)> = Vec::new();

        for doc in &self.docs {
            if let Some(filter) = &query.filter {
                let matches = doc
                    .get(&filter.field)
                    .and_then(Value::as_str)
                    .map(|value| value == filter.value)
                    .unwrap_or(false);
                if !matches {
                    continue;
                }
            }

            if query.fields.is_empty() {
                // Field-less query searches every stored field.
                let total_hits: usize = doc
                    .keys()
                    .map(|field| field_hits(doc, field, &query.terms))
                    .sum();
                if total_hits > 0 {
                    scored.push((total_hits, doc));
                }
                continue;
            }

            let mut total_hits = 0usize;
            let mut every_field_hit = true;
            for field in &query.fields {
                let hits = field_hits(doc, field, &query.terms);
                if hits == 0 {
                    every_field_hit = false;
                    break;
                }
                total_hits += hits;
            }

            if every_field_hit {
                scored.push((total_hits, doc));
            }
        }

        // Stable sort keeps insertion order among equal relevance.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(query.rows)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

fn field_hits(doc: &Record, field: &str, terms: &[String]) -> usize {
    let Some(text) = doc.get(field).and_then(Value::as_str) else {
        return 0;
    };
    let tokens: Vec<&str> = text.split_whitespace().collect();
    terms
        .iter()
        .filter(|term| tokens.contains(&term.as_str()))
        .count()
}
