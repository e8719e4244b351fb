//! docdex-search: dual-engine document retrieval
//!
//! This crate indexes a corpus of short business documents and answers
//! ranked queries with two interchangeable strategies: lexical BM25 scoring
//! over an inverted term index, and semantic cosine-similarity ranking over
//! dense embeddings. A benchmarking harness times both engines on identical
//! queries, and a corpus store owns the documents, rebuilds stale indices on
//! demand, and degrades to an unranked substring scan when an engine is
//! unavailable.
//!
//! ## Key Modules
//!
//! - **[`tokenizer`]**: Shared text normalization for indexing and queries
//! - **[`lexical`]**: The BM25 engine and its tuning parameters
//! - **[`semantic`]**: The embedding engine over the provider capability
//! - **[`engine`]**: The uniform engine contract both implement
//! - **[`benchmark`]**: Timed comparison of the two engines
//! - **[`store`]**: Canonical document storage and index lifecycle
//!
//! ## Quick Start
//!
//! ```rust
//! use docdex_search::{CorpusStore, Document, EngineKind};
//! use docdex_embed::HashingEmbeddingProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = CorpusStore::new(Arc::new(HashingEmbeddingProvider::default()));
//!
//! store.add_document(
//!     Document::new("pol-1", "Política de contraseñas corporativas")
//!         .with_metadata("filename", "contraseñas.pdf"),
//! )?;
//!
//! // ranked search; falls back to a substring scan if the engine fails
//! let hits = store.search("contraseñas", EngineKind::Lexical).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Documents → CorpusStore → (stale?) rebuild → LexicalIndex / EmbeddingIndex
//!                 ↓                                       ↓
//!           Basic substring scan  ←──  fallback  ←──  query failure
//!                 ↓
//!         RetrievalBenchmark → BenchmarkReport (reporting side)
//! ```

pub mod benchmark;
pub mod document;
pub mod engine;
pub mod error;
pub mod lexical;
pub mod semantic;
pub mod store;
pub mod tokenizer;

// Re-export main types for easy access
pub use benchmark::{
    BenchmarkReport, Comparison, EngineRun, RetrievalBenchmark, RunStats, DEFAULT_ITERATIONS,
};
pub use document::{CorpusStats, Document, SearchResult};
pub use engine::{EngineKind, EngineStats, SearchEngine};
pub use error::{Result, SearchError};
pub use lexical::{Bm25Params, LexicalIndex};
pub use semantic::EmbeddingIndex;
pub use store::{CorpusStore, StoreEngineStats, STORE_SEARCH_LIMIT};
