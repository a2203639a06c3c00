use answer::EntityResolver;
use async_trait::async_trait;
use backends::{DocumentIndex, IndexClient, IndexError, IndexQuery, MemoryIndex, record};
use kotae_core::config::ResolverConfig;
use kotae_core::model::{MissingSlot, Record};
use kotae_core::synonym::SynonymTable;
use nlu::{CjkSegmenter, WordVectors};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Deterministic stand-in for the word-vector model: distance is the number
/// of tokens appearing on only one side.
struct OverlapVectors;

impl WordVectors for OverlapVectors {
    fn distance(&self, left: &[String], right: &[String]) -> f32 {
        if left.is_empty() || right.is_empty() {
            return f32::INFINITY;
        }
        let only_left = left.iter().filter(|w| !right.contains(w)).count();
        let only_right = right.iter().filter(|w| !left.contains(w)).count();
        (only_left + only_right) as f32
    }
}

/// Index wrapper that records every query it serves.
struct RecordingIndex {
    inner: MemoryIndex,
    queries: Mutex<Vec<IndexQuery>>,
}

impl RecordingIndex {
    fn new(docs: Vec<Record>) -> Self {
        Self {
            inner: MemoryIndex::new(docs),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn last_query(&self) -> IndexQuery {
        self.queries.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl DocumentIndex for RecordingIndex {
    async fn search(&self, query: &IndexQuery) -> Result<Vec<Record>, IndexError> {
        self.queries.lock().unwrap().push(query.clone());
        self.inner.search(query).await
    }
}

fn resolver_over(backend: Arc<dyn DocumentIndex>, synonyms: SynonymTable) -> EntityResolver {
    EntityResolver::new(
        IndexClient::new("biology-triple", backend, Arc::new(CjkSegmenter::new()), 50),
        Arc::new(CjkSegmenter::new()),
        Arc::new(OverlapVectors),
        Arc::new(synonyms),
        ResolverConfig::default(),
    )
}

fn subject_docs() -> Vec<Record> {
    vec![
        record(json!({
            "triple_subject": "细胞",
            "triple_subject_index": "细 胞",
            "attribute_name": "name"
        })),
        record(json!({
            "triple_subject": "细胞凋亡",
            "triple_subject_index": "细 胞 凋 亡",
            "attribute_name": "name"
        })),
        record(json!({
            "triple_subject": "叶绿体",
            "triple_subject_index": "叶 绿 体",
            "attribute_name": "name"
        })),
    ]
}

#[tokio::test]
async fn missing_object_queries_with_the_name_filter() {
    let backend = Arc::new(RecordingIndex::new(subject_docs()));
    let resolver = resolver_over(backend.clone(), SynonymTable::new());

    resolver.resolve("细胞凋亡", MissingSlot::Object).await;

    let query = backend.last_query();
    assert_eq!(query.fields, ["triple_subject_index"]);
    let filter = query.filter.expect("subject lookup must filter on names");
    assert_eq!(filter.field, "attribute_name");
    assert_eq!(filter.value, "name");
}

#[tokio::test]
async fn missing_subject_queries_without_the_name_filter() {
    let backend = Arc::new(RecordingIndex::new(subject_docs()));
    let resolver = resolver_over(backend.clone(), SynonymTable::new());

    resolver.resolve("细胞凋亡", MissingSlot::Subject).await;

    let query = backend.last_query();
    assert_eq!(query.fields, ["triple_subject_index"]);
    assert!(query.filter.is_none());
}

#[tokio::test]
async fn longer_full_matches_beat_shorter_ones() {
    // Both "细胞" and "细胞凋亡" are full-length contiguous matches of the
    // title; the longer, more specific subject must win.
    let backend = Arc::new(MemoryIndex::new(subject_docs()));
    let resolver = resolver_over(backend, SynonymTable::new());

    let filler = resolver.resolve("细胞凋亡", MissingSlot::Object).await;
    assert_eq!(filler.as_deref(), Some("细胞凋亡"));
}

#[tokio::test]
async fn partial_matches_fall_below_the_full_match_threshold() {
    let backend = Arc::new(MemoryIndex::new(vec![record(json!({
        "triple_subject": "细胞凋亡机制",
        "triple_subject_index": "细 胞 凋 亡 机 制",
        "attribute_name": "name"
    }))]));
    let resolver = resolver_over(backend, SynonymTable::new());

    // LCS covers 4 of 6 indexed tokens; below the 1.0 default.
    let filler = resolver.resolve("细胞凋亡", MissingSlot::Object).await;
    assert!(filler.is_none());
}

#[tokio::test]
async fn synonym_expansion_rescues_alternate_surface_forms() {
    let docs = vec![record(json!({
        "triple_subject": "脱氧核糖核酸",
        "triple_subject_index": "脱 氧 核 糖 核 酸 dna",
        "attribute_name": "name"
    }))];
    let synonyms = SynonymTable::from_entries([("脱氧核糖核酸", vec!["DNA"])]);

    let backend = Arc::new(MemoryIndex::new(docs));
    let resolver = resolver_over(backend, synonyms);

    let filler = resolver.resolve("DNA", MissingSlot::Object).await;
    assert_eq!(filler.as_deref(), Some("脱氧核糖核酸"));
}

#[tokio::test]
async fn missing_subject_ranks_by_similarity_and_returns_the_object() {
    let docs = vec![
        record(json!({
            "triple_subject": "细胞凋亡",
            "triple_subject_index": "细 胞 凋 亡",
            "triple_object": "由基因决定的细胞自动结束生命的过程"
        })),
        record(json!({
            "triple_subject": "细胞分裂",
            "triple_subject_index": "细 胞 分 裂",
            "triple_object": "一个细胞分成两个细胞的过程"
        })),
    ];

    let backend = Arc::new(MemoryIndex::new(docs));
    let resolver = resolver_over(backend, SynonymTable::new());

    // Exact token overlap with the first record: distance 0, similarity 1.
    let filler = resolver.resolve("细胞凋亡", MissingSlot::Subject).await;
    assert_eq!(filler.as_deref(), Some("由基因决定的细胞自动结束生命的过程"));
}

#[tokio::test]
async fn similarity_at_or_below_the_threshold_is_discarded() {
    let docs = vec![record(json!({
        "triple_subject": "细胞膜的成分",
        "triple_subject_index": "细 胞 膜 成 分",
        "triple_object": "磷脂双分子层和蛋白质"
    }))];

    let backend = Arc::new(MemoryIndex::new(docs));
    let resolver = resolver_over(backend, SynonymTable::new());

    // OverlapVectors distance 5 -> similarity exp(-5) ≈ 0.007, under 0.5.
    let filler = resolver.resolve("细胞凋亡", MissingSlot::Subject).await;
    assert!(filler.is_none());
}
