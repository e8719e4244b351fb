//! Error types for the search system

use docdex_embed::EmbedError;

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error type for index builds and engine queries.
///
/// None of these are fatal to the process: duplicate ids are rejected at the
/// insertion boundary, and embedding failures trigger a fallback to a
/// non-semantic engine at the corpus-store level.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A document id appeared more than once in an insert or build
    #[error("Duplicate document id: {id}")]
    DuplicateDocumentId { id: String },

    /// The embedding provider failed or timed out
    #[error("Embedding failure: {source}")]
    Embedding {
        #[from]
        source: EmbedError,
    },

    /// An engine was queried before any build completed.
    ///
    /// Internal precondition: the corpus store self-heals by building before
    /// querying, so callers going through it never observe this.
    #[error("Index not built")]
    IndexNotBuilt,
}

impl SearchError {
    /// Create a duplicate-id error
    pub fn duplicate_id<S: Into<String>>(id: S) -> Self {
        Self::DuplicateDocumentId { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_id_display() {
        let err = SearchError::duplicate_id("doc-7");
        assert_eq!(err.to_string(), "Duplicate document id: doc-7");
    }

    #[test]
    fn test_embed_error_converts() {
        let err: SearchError = EmbedError::provider_unavailable("down").into();
        assert!(matches!(err, SearchError::Embedding { .. }));
    }
}
