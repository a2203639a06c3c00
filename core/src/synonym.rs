use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynonymError {
    #[error("failed to read synonym table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("synonym table is not a valid JSON object: {0}")]
    Parse(#[from] serde_json::Error),
}

impl crate::error::KotaeError for SynonymError {
    fn error_code(&self) -> crate::error::ErrorCode {
        match self {
            SynonymError::Io { .. } => crate::error::ErrorCode::Unavailable,
            SynonymError::Parse(_) => crate::error::ErrorCode::InvalidArgument,
        }
    }
}

/// Entity -> alternate surface forms. Loaded once at startup, read-only for
/// the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file mapping entity strings to alternate lists.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SynonymError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SynonymError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let entries: HashMap<String, Vec<String>> = serde_json::from_str(&raw)?;
        tracing::info!(path = %path.display(), entries = entries.len(), "synonym table loaded");
        Ok(Self { entries })
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, values)| {
                    (key.into(), values.into_iter().map(Into::into).collect())
                })
                .collect(),
        }
    }

    /// Alternate surface forms for an entity; empty when none are known.
    pub fn expand(&self, entity: &str) -> &[String] {
        self.entries.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_reads_json_object_of_lists() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"脱氧核糖核酸": ["DNA", "去氧核糖核酸"], "三磷酸腺苷": ["ATP"]}}"#
        )
        .unwrap();

        let table = SynonymTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.expand("脱氧核糖核酸"), ["DNA", "去氧核糖核酸"]);
        assert!(table.expand("细胞").is_empty());
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            SynonymTable::load(file.path()),
            Err(SynonymError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            SynonymTable::load("/nonexistent/synonyms.json"),
            Err(SynonymError::Io { .. })
        ));
    }
}
