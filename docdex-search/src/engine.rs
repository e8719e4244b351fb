//! The uniform engine contract implemented by both ranking engines

use crate::document::{Document, SearchResult};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifies which search strategy handles a query.
///
/// `Basic` is the unranked substring scan owned by the corpus store; it is
/// not a [`SearchEngine`] implementation but exists here so callers select
/// all three routes through one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Lexical,
    Semantic,
    Basic,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Lexical => write!(f, "lexical"),
            EngineKind::Semantic => write!(f, "semantic"),
            EngineKind::Basic => write!(f, "basic"),
        }
    }
}

/// Engine statistics as a tagged type, one variant per engine.
///
/// Serialized for the reporting side; the tag keeps the shapes from being
/// confused when both engines' stats travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum EngineStats {
    Lexical {
        total_documents: usize,
        total_terms: usize,
        avg_doc_length: f32,
        k1: f32,
        b: f32,
    },
    Semantic {
        total_documents: usize,
        embedding_dimension: usize,
        model: String,
    },
}

/// Uniform contract for a ranked search engine over a corpus snapshot.
///
/// `index` rebuilds the engine's internal state wholesale from the given
/// snapshot; engines never patch state incrementally. `search` is read-only
/// and safe for concurrent callers once a build has completed.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Rebuild the index from scratch over a corpus snapshot.
    ///
    /// Fails with [`SearchError::DuplicateDocumentId`](crate::SearchError)
    /// when the snapshot contains the same id twice. Building over an empty
    /// snapshot succeeds and yields an engine that returns no results.
    async fn index(&mut self, documents: Arc<[Document]>) -> Result<()>;

    /// Return up to `limit` results ranked by descending score.
    ///
    /// Ties are broken by ascending document id so rankings are
    /// deterministic. An empty query yields an empty result set.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Current engine statistics
    fn stats(&self) -> EngineStats;

    /// Whether a build has completed since construction
    fn is_built(&self) -> bool;
}
