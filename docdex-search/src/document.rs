//! Document and result types shared across the search engines

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document as stored in the corpus.
///
/// Documents are supplied by the ingestion side with an externally assigned
/// id and are immutable once indexed. Replacing one means removing it and
/// adding a new document, which invalidates the built indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Externally assigned unique identifier
    pub id: String,
    /// Full text content, already extracted/preprocessed upstream
    pub content: String,
    /// Opaque key-value metadata (e.g. `filename`, `type`)
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with empty metadata
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry (builder style)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A single ranked hit returned by a search engine.
///
/// `score` semantics depend on the engine that produced it: BM25 scores are
/// unbounded and non-negative, cosine similarities lie in [-1, 1]. Scores
/// from different engines are not comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: String,
    pub score: f32,
    pub content: String,
    pub metadata: HashMap<String, String>,
}

/// Aggregate statistics over the stored corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of documents currently stored
    pub total_documents: usize,
    /// Document counts keyed by the `type` metadata entry
    pub by_type: HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("doc-1", "política de acceso")
            .with_metadata("filename", "acceso.pdf")
            .with_metadata("type", "policy");

        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.metadata.get("filename").unwrap(), "acceso.pdf");
        assert_eq!(doc.metadata.get("type").unwrap(), "policy");
    }

    #[test]
    fn test_search_result_serializes() {
        let result = SearchResult {
            document_id: "doc-1".to_string(),
            score: 1.25,
            content: "texto".to_string(),
            metadata: HashMap::new(),
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"document_id\":\"doc-1\""));
    }
}
