//! Semantic ranking engine over dense embeddings
//!
//! Ranks documents by cosine similarity between a query embedding and the
//! per-document embeddings produced at build time. The engine depends only on
//! the [`EmbeddingProvider`] capability, so the real ONNX model and the
//! deterministic hashing double are interchangeable behind it.
//!
//! Builds are all-or-nothing: embeddings are generated into a local map and
//! only assigned once every document embedded successfully. A provider
//! failure halfway through leaves the engine in its previous state.

use crate::document::{Document, SearchResult};
use crate::engine::{EngineStats, SearchEngine};
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use docdex_embed::{EmbedConfig, EmbedError, EmbeddingProvider, EmbeddingResult};
use half::f16;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Cosine similarity between two equal-length vectors.
///
/// Stored embeddings are already L2-normalized, but the full quotient is
/// computed anyway so a zero vector (for example from embedding empty text)
/// yields 0.0 instead of dividing by zero.
fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Semantic search engine ranking by embedding similarity.
///
/// No minimum-similarity floor is applied: low-similarity matches still
/// appear when they fit within the caller's limit.
pub struct EmbeddingIndex {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbedConfig,
    corpus: Arc<[Document]>,
    doc_embedding: HashMap<String, Vec<f16>>,
    dimension: usize,
    built: bool,
}

impl EmbeddingIndex {
    /// Create an engine over the given provider. No index exists until
    /// [`index`](SearchEngine::index) runs.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbedConfig) -> Self {
        let dimension = provider.embedding_dimension();
        Self {
            provider,
            config,
            corpus: Arc::from(vec![]),
            doc_embedding: HashMap::new(),
            dimension,
            built: false,
        }
    }

    /// Truncate text to the configured character bound before it reaches the
    /// model. Char-based so multi-byte content never splits mid-character.
    fn truncate_input(&self, text: &str) -> String {
        text.chars().take(self.config.max_input_chars).collect()
    }

    /// Embed a batch under the configured time bound.
    async fn embed_bounded(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let outcome =
            tokio::time::timeout(self.config.embed_timeout, self.provider.embed_texts(texts))
                .await;

        match outcome {
            Ok(result) => Ok(result?),
            Err(_) => Err(EmbedError::timeout(self.config.embed_timeout).into()),
        }
    }
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_name())
            .field("total_docs", &self.doc_embedding.len())
            .field("dimension", &self.dimension)
            .field("built", &self.built)
            .finish()
    }
}

#[async_trait]
impl SearchEngine for EmbeddingIndex {
    async fn index(&mut self, documents: Arc<[Document]>) -> Result<()> {
        let mut seen_ids: HashSet<&str> = HashSet::with_capacity(documents.len());
        for doc in documents.iter() {
            if !seen_ids.insert(&doc.id) {
                return Err(SearchError::duplicate_id(doc.id.as_str()));
            }
        }

        let texts: Vec<String> = documents
            .iter()
            .map(|doc| self.truncate_input(&doc.content))
            .collect();

        tracing::debug!(
            documents = documents.len(),
            provider = self.provider.provider_name(),
            "generating embeddings for semantic index"
        );

        // Build into a local map; the engine state is only replaced after
        // every document embedded, so a provider failure discards the batch.
        let result = self.embed_bounded(&texts).await?;
        if result.len() != documents.len() {
            return Err(EmbedError::provider_unavailable(format!(
                "provider returned {} embeddings for {} documents",
                result.len(),
                documents.len()
            ))
            .into());
        }

        let mut doc_embedding = HashMap::with_capacity(documents.len());
        for (doc, embedding) in documents.iter().zip(result.embeddings) {
            doc_embedding.insert(doc.id.clone(), embedding);
        }

        let dimension = if result.dimension > 0 {
            result.dimension
        } else {
            self.provider.embedding_dimension()
        };

        tracing::debug!(
            total_docs = doc_embedding.len(),
            dimension,
            "built semantic index"
        );

        self.corpus = documents;
        self.doc_embedding = doc_embedding;
        self.dimension = dimension;
        self.built = true;

        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if !self.built {
            return Err(SearchError::IndexNotBuilt);
        }
        if query.trim().is_empty() {
            return Ok(vec![]);
        }

        let query_embedding = {
            let texts = vec![self.truncate_input(query)];
            let result = self.embed_bounded(&texts).await?;
            result.embeddings.into_iter().next().ok_or_else(|| {
                EmbedError::provider_unavailable("no embedding generated for query")
            })?
        };

        let results = self
            .corpus
            .iter()
            .filter_map(|doc| {
                self.doc_embedding
                    .get(&doc.id)
                    .map(|embedding| (doc, cosine_similarity(&query_embedding, embedding)))
            })
            .sorted_by(|(a, score_a), (b, score_b)| {
                score_b
                    .total_cmp(score_a)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .take(limit)
            .map(|(doc, score)| SearchResult {
                document_id: doc.id.clone(),
                score,
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
            })
            .collect();

        Ok(results)
    }

    fn stats(&self) -> EngineStats {
        EngineStats::Semantic {
            total_documents: self.doc_embedding.len(),
            embedding_dimension: self.dimension,
            model: self.provider.model_name().to_string(),
        }
    }

    fn is_built(&self) -> bool {
        self.built
    }
}
