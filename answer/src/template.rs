use backends::{IndexClient, IndexError};
use kotae_core::error::KotaeError;
use kotae_core::model::{MissingSlot, Record};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Named capture every template pattern must bind.
pub const TITLE_CAPTURE: &str = "title";

const TEMPLATE_QUERY_FIELDS: [&str; 1] = ["key_index"];
const DEFAULT_PRIORITY: i64 = 4;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("pattern failed to compile: {0}")]
    BadPattern(#[from] regex::Error),
    #[error("pattern has no `title` capture: {0}")]
    MissingTitleCapture(String),
    #[error("template row is missing field `{0}`")]
    MissingField(&'static str),
    #[error("unknown missing_tuple value: {0}")]
    UnknownSlot(String),
}

impl KotaeError for TemplateError {
    fn error_code(&self) -> kotae_core::error::ErrorCode {
        kotae_core::error::ErrorCode::InvalidArgument
    }
}

/// A question-pattern rule: regex with a `title` capture, the predicates it
/// maps to, its priority (1 = exact/authoritative), and which triple slot it
/// leaves unresolved. Compiled once per template load.
#[derive(Debug, Clone)]
pub struct Template {
    pub pattern: String,
    pub regex: Regex,
    pub predicates: Vec<String>,
    pub priority: i64,
    pub missing_slot: MissingSlot,
}

impl Template {
    pub fn from_record(record: &Record) -> Result<Self, TemplateError> {
        let pattern = record
            .get("pattern")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(TemplateError::MissingField("pattern"))?
            .to_string();

        let regex = Regex::new(&pattern)?;
        if !regex
            .capture_names()
            .any(|name| name == Some(TITLE_CAPTURE))
        {
            return Err(TemplateError::MissingTitleCapture(pattern));
        }

        let predicates: Vec<String> = record
            .get("predicates")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if predicates.is_empty() {
            return Err(TemplateError::MissingField("predicates"));
        }

        let priority = record
            .get("priority")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_PRIORITY);

        let missing_slot = match record.get("missing_tuple").and_then(Value::as_str) {
            Some("subject") => MissingSlot::Subject,
            Some("object") => MissingSlot::Object,
            Some(other) => return Err(TemplateError::UnknownSlot(other.to_string())),
            None => return Err(TemplateError::MissingField("missing_tuple")),
        };

        Ok(Self {
            pattern,
            regex,
            predicates,
            priority,
            missing_slot,
        })
    }

    /// Apply the pattern anchored at the start of the question; returns the
    /// bound `title` capture on a hit.
    fn apply(&self, query: &str) -> Option<String> {
        let captures = self.regex.captures(query)?;
        if captures.get(0).map(|m| m.start()) != Some(0) {
            return None;
        }
        captures
            .name(TITLE_CAPTURE)
            .map(|m| m.as_str().to_string())
    }
}

/// A template whose pattern matched the question.
#[derive(Debug, Clone)]
pub struct TemplateMatch {
    pub template: Template,
    pub title: String,
}

/// Scans index-retrieved templates against the normalized question. The
/// first priority-1 hit is authoritative: it discards everything accumulated
/// and everything not yet scanned.
pub struct TemplateMatcher {
    templates: IndexClient,
}

impl TemplateMatcher {
    pub fn new(templates: IndexClient) -> Self {
        Self { templates }
    }

    pub async fn matches(&self, query: &str) -> Vec<TemplateMatch> {
        let docs = match self
            .templates
            .search_seg(query, &TEMPLATE_QUERY_FIELDS, None)
            .await
        {
            Ok(docs) => docs,
            Err(IndexError::EmptyTerms) => return Vec::new(),
            Err(err) => {
                warn!(code = %err.error_code(), error = %err, "template retrieval failed");
                return Vec::new();
            }
        };

        let mut matched = Vec::new();
        for doc in &docs {
            let template = match Template::from_record(doc) {
                Ok(template) => template,
                Err(err) => {
                    warn!(error = %err, "skipping malformed template");
                    continue;
                }
            };

            let Some(title) = template.apply(query) else {
                debug!(pattern = %template.pattern, "pattern did not match");
                continue;
            };

            debug!(
                pattern = %template.pattern,
                priority = template.priority,
                title = %title,
                "template matched"
            );
            let hit = TemplateMatch { template, title };
            if hit.template.priority == 1 {
                return vec![hit];
            }
            matched.push(hit);
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backends::record;
    use serde_json::json;

    #[test]
    fn from_record_compiles_and_validates() {
        let template = Template::from_record(&record(json!({
            "pattern": "什么是(?P<title>.+)",
            "predicates": ["BIOLOGY_CONCEPT"],
            "priority": 1,
            "missing_tuple": "object"
        })))
        .unwrap();

        assert_eq!(template.priority, 1);
        assert_eq!(template.missing_slot, MissingSlot::Object);
        assert_eq!(template.apply("什么是细胞凋亡").as_deref(), Some("细胞凋亡"));
    }

    #[test]
    fn match_is_anchored_at_the_start() {
        let template = Template::from_record(&record(json!({
            "pattern": "什么是(?P<title>.+)",
            "predicates": ["BIOLOGY_CONCEPT"],
            "missing_tuple": "object"
        })))
        .unwrap();

        assert!(template.apply("请问什么是细胞凋亡").is_none());
    }

    #[test]
    fn missing_priority_defaults() {
        let template = Template::from_record(&record(json!({
            "pattern": "(?P<title>.+)的定义",
            "predicates": ["BIOLOGY_CONCEPT"],
            "missing_tuple": "object"
        })))
        .unwrap();
        assert_eq!(template.priority, 4);
    }

    #[test]
    fn pattern_without_title_capture_is_rejected() {
        let err = Template::from_record(&record(json!({
            "pattern": "什么是(.+)",
            "predicates": ["BIOLOGY_CONCEPT"],
            "missing_tuple": "object"
        })))
        .unwrap_err();
        assert!(matches!(err, TemplateError::MissingTitleCapture(_)));
    }

    #[test]
    fn unparseable_pattern_is_rejected() {
        let err = Template::from_record(&record(json!({
            "pattern": "什么是(?P<title>.+",
            "predicates": ["BIOLOGY_CONCEPT"],
            "missing_tuple": "object"
        })))
        .unwrap_err();
        assert!(matches!(err, TemplateError::BadPattern(_)));
    }
}
