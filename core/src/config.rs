use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

const DEFAULT_ROWS: usize = 50;
const DEFAULT_SUBJECT_MATCH_THRESHOLD: f32 = 1.0;
const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;
const DEFAULT_SIMILARITY_DECAY: f32 = 1.0;

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    pub template_collection: String,
    pub triple_collection: String,
    pub rows: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            template_collection: "biology-template".to_string(),
            triple_collection: "biology-triple".to_string(),
            rows: DEFAULT_ROWS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    /// Minimum LCS ratio for a subject candidate; 1.0 keeps only
    /// full-length contiguous matches.
    pub subject_match_threshold: f32,
    /// Minimum transformed word-mover similarity, compared as
    /// `similarity > threshold` everywhere.
    pub similarity_threshold: f32,
    /// Decay constant of the distance-to-similarity transform.
    pub similarity_decay: f32,
    /// Path to the synonym table, empty or absent to start without one.
    #[serde(default)]
    pub synonym_path: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            subject_match_threshold: DEFAULT_SUBJECT_MATCH_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            similarity_decay: DEFAULT_SIMILARITY_DECAY,
            synonym_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub resolver: ResolverConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("KOTAE"));

        builder.build()?.try_deserialize()
    }
}
