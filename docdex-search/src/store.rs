//! Canonical document storage and index lifecycle
//!
//! [`CorpusStore`] owns the document collection and decides when the ranking
//! engines get rebuilt. Mutations bump a corpus version; each engine slot
//! remembers the version it was built from, and a query against a stale slot
//! rebuilds synchronously before searching. Built engines live behind an
//! `Arc` that is swapped atomically, so readers either see the previous
//! complete index or the new complete index, never a half-built one.
//!
//! Every ranked search degrades to the unranked substring scan when the
//! engine cannot build or answer, so callers always get a result set back.

use crate::benchmark::{BenchmarkReport, RetrievalBenchmark};
use crate::document::{CorpusStats, Document};
use crate::engine::{EngineKind, EngineStats, SearchEngine};
use crate::error::{Result, SearchError};
use crate::lexical::{Bm25Params, LexicalIndex};
use crate::semantic::EmbeddingIndex;
use docdex_embed::{EmbedConfig, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Result limit applied to ranked searches routed through the store.
pub const STORE_SEARCH_LIMIT: usize = 20;

/// Documents plus the version counter that invalidates built indices.
struct CorpusInner {
    /// Insertion order is preserved; basic search reports hits in this order
    documents: Vec<Document>,
    ids: HashSet<String>,
    version: u64,
}

/// A fully built engine and the corpus version it was built from.
struct BuiltEngine {
    engine: Arc<dyn SearchEngine>,
    version: u64,
}

/// Per-engine slot: the current snapshot plus a single-writer build lock.
struct EngineSlot {
    snapshot: RwLock<Option<BuiltEngine>>,
    build_lock: Mutex<()>,
}

impl EngineSlot {
    fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Clone the built engine if it matches the current corpus version.
    fn fresh(&self, version: u64) -> Option<Arc<dyn SearchEngine>> {
        let guard = self.snapshot.read().unwrap();
        guard
            .as_ref()
            .filter(|built| built.version == version)
            .map(|built| built.engine.clone())
    }
}

/// Both engines' statistics as reported by the store. A side is `None` until
/// that engine has been built against the current corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEngineStats {
    pub lexical: Option<EngineStats>,
    pub semantic: Option<EngineStats>,
}

/// Owner of the canonical document collection and the two ranking engines.
///
/// Constructed once by the application and shared by reference; there is no
/// hidden global instance. Reads against built engines are lock-free beyond
/// an `Arc` clone, and rebuilds are serialized per engine.
pub struct CorpusStore {
    inner: RwLock<CorpusInner>,
    provider: Arc<dyn EmbeddingProvider>,
    embed_config: EmbedConfig,
    bm25_params: Bm25Params,
    lexical: EngineSlot,
    semantic: EngineSlot,
}

impl CorpusStore {
    /// Create an empty store using default engine parameters.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            inner: RwLock::new(CorpusInner {
                documents: Vec::new(),
                ids: HashSet::new(),
                version: 0,
            }),
            provider,
            embed_config: EmbedConfig::default(),
            bm25_params: Bm25Params::default(),
            lexical: EngineSlot::new(),
            semantic: EngineSlot::new(),
        }
    }

    /// Override the embedding configuration (builder style)
    pub fn with_embed_config(mut self, embed_config: EmbedConfig) -> Self {
        self.embed_config = embed_config;
        self
    }

    /// Override the BM25 parameters (builder style)
    pub fn with_bm25_params(mut self, bm25_params: Bm25Params) -> Self {
        self.bm25_params = bm25_params;
        self
    }

    /// Insert a document, rejecting duplicate ids. Any successful insert
    /// marks both engine slots stale.
    pub fn add_document(&self, document: Document) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.ids.insert(document.id.clone()) {
            return Err(SearchError::duplicate_id(document.id.as_str()));
        }

        tracing::debug!(id = %document.id, "document added, indices marked stale");
        inner.documents.push(document);
        inner.version += 1;
        Ok(())
    }

    /// Fetch a document by id.
    pub fn get_document(&self, id: &str) -> Option<Document> {
        let inner = self.inner.read().unwrap();
        inner.documents.iter().find(|doc| doc.id == id).cloned()
    }

    /// All documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.inner.read().unwrap().documents.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Corpus-level statistics. Documents without a `type` metadata entry
    /// are counted under `unknown`.
    pub fn stats(&self) -> CorpusStats {
        let inner = self.inner.read().unwrap();
        let mut by_type: HashMap<String, usize> = HashMap::new();
        for doc in &inner.documents {
            let doc_type = doc
                .metadata
                .get("type")
                .map(String::as_str)
                .unwrap_or("unknown");
            *by_type.entry(doc_type.to_string()).or_insert(0) += 1;
        }

        CorpusStats {
            total_documents: inner.documents.len(),
            by_type,
        }
    }

    /// Search the corpus with the selected strategy.
    ///
    /// `Basic` scans for a case-insensitive substring and never fails. The
    /// ranked strategies rebuild their index first when it is stale, and any
    /// build or query failure degrades to the basic scan after logging the
    /// cause, so this method always returns a result set.
    pub async fn search(&self, query: &str, engine: EngineKind) -> Vec<Document> {
        if self.is_empty() {
            return vec![];
        }

        match engine {
            EngineKind::Basic => self.basic_search(query),
            kind => match self.ranked_search(query, kind).await {
                Ok(documents) => documents,
                Err(err) => {
                    tracing::warn!("{kind} search failed, falling back to basic scan: {err}");
                    self.basic_search(query)
                }
            },
        }
    }

    /// Unranked case-insensitive substring scan over content and metadata
    /// values (the filename lives in metadata). Hits come back in insertion
    /// order.
    fn basic_search(&self, query: &str) -> Vec<Document> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().unwrap();
        inner
            .documents
            .iter()
            .filter(|doc| {
                doc.content.to_lowercase().contains(&needle)
                    || doc
                        .metadata
                        .values()
                        .any(|value| value.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    async fn ranked_search(&self, query: &str, kind: EngineKind) -> Result<Vec<Document>> {
        let engine = self.ensure_engine(kind).await?;
        let results = engine.search(query, STORE_SEARCH_LIMIT).await?;

        let inner = self.inner.read().unwrap();
        Ok(results
            .iter()
            .filter_map(|result| {
                inner
                    .documents
                    .iter()
                    .find(|doc| doc.id == result.document_id)
                    .cloned()
            })
            .collect())
    }

    /// Return the engine for `kind`, rebuilding it when stale or absent.
    ///
    /// The build lock makes rebuilds single-writer; concurrent readers keep
    /// using the previous snapshot until the finished engine replaces it.
    async fn ensure_engine(&self, kind: EngineKind) -> Result<Arc<dyn SearchEngine>> {
        let slot = match kind {
            EngineKind::Lexical => &self.lexical,
            EngineKind::Semantic => &self.semantic,
            EngineKind::Basic => return Err(SearchError::IndexNotBuilt),
        };

        if let Some(engine) = slot.fresh(self.current_version()) {
            return Ok(engine);
        }

        let _build = slot.build_lock.lock().await;
        // another caller may have finished the rebuild while we waited
        if let Some(engine) = slot.fresh(self.current_version()) {
            return Ok(engine);
        }

        let (corpus, version) = self.corpus_snapshot();
        tracing::info!(
            "{kind} index stale or missing, rebuilding over {} documents",
            corpus.len()
        );

        let engine: Arc<dyn SearchEngine> = match kind {
            EngineKind::Lexical => {
                let mut index = LexicalIndex::new(self.bm25_params);
                index.index(corpus).await?;
                Arc::new(index)
            }
            EngineKind::Semantic => {
                let mut index =
                    EmbeddingIndex::new(self.provider.clone(), self.embed_config.clone());
                index.index(corpus).await?;
                Arc::new(index)
            }
            EngineKind::Basic => unreachable!("basic search has no index"),
        };

        *slot.snapshot.write().unwrap() = Some(BuiltEngine {
            engine: engine.clone(),
            version,
        });

        Ok(engine)
    }

    fn current_version(&self) -> u64 {
        self.inner.read().unwrap().version
    }

    /// Clone the corpus together with the version it represents.
    fn corpus_snapshot(&self) -> (Arc<[Document]>, u64) {
        let inner = self.inner.read().unwrap();
        (Arc::from(inner.documents.clone()), inner.version)
    }

    /// Statistics of the built engines. A side is `None` until that engine
    /// has been built against the current corpus; mutation resets both sides
    /// until the next rebuild.
    pub fn engine_stats(&self) -> StoreEngineStats {
        let version = self.current_version();
        StoreEngineStats {
            lexical: self.lexical.fresh(version).map(|engine| engine.stats()),
            semantic: self.semantic.fresh(version).map(|engine| engine.stats()),
        }
    }

    /// Run the comparative benchmark over the current corpus.
    ///
    /// Fresh engine instances are built from a snapshot taken at call time,
    /// so the benchmark never interferes with the store's own slots.
    pub async fn benchmark(&self, query: &str, iterations: usize) -> BenchmarkReport {
        let (corpus, _) = self.corpus_snapshot();
        let mut benchmark = RetrievalBenchmark::new(
            Box::new(LexicalIndex::new(self.bm25_params)),
            Box::new(EmbeddingIndex::new(
                self.provider.clone(),
                self.embed_config.clone(),
            )),
            corpus,
        );
        benchmark.compare(query, iterations).await
    }
}

impl std::fmt::Debug for CorpusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusStore")
            .field("documents", &self.len())
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::DEFAULT_ITERATIONS;
    use async_trait::async_trait;
    use docdex_embed::{EmbedError, EmbeddingResult, HashingEmbeddingProvider};
    use half::f16;

    /// Provider that always fails, standing in for an unreachable model.
    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed_text(&self, _text: &str) -> docdex_embed::Result<Vec<f16>> {
            Err(EmbedError::provider_unavailable("model offline"))
        }

        async fn embed_texts(&self, _texts: &[String]) -> docdex_embed::Result<EmbeddingResult> {
            Err(EmbedError::provider_unavailable("model offline"))
        }

        fn embedding_dimension(&self) -> usize {
            384
        }

        fn provider_name(&self) -> &str {
            "failing"
        }

        fn model_name(&self) -> &str {
            "none"
        }
    }

    fn store() -> CorpusStore {
        CorpusStore::new(Arc::new(HashingEmbeddingProvider::default()))
    }

    fn policy_doc(id: &str, content: &str) -> Document {
        Document::new(id, content)
            .with_metadata("filename", format!("{id}.pdf"))
            .with_metadata("type", "policy")
    }

    #[test]
    fn test_add_and_get() {
        let store = store();
        store
            .add_document(policy_doc("a", "política de contraseñas"))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert_eq!(store.get_document("a").unwrap().id, "a");
        assert!(store.get_document("missing").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = store();
        store.add_document(Document::new("a", "primero")).unwrap();

        let err = store
            .add_document(Document::new("a", "segundo"))
            .unwrap_err();
        assert!(matches!(err, SearchError::DuplicateDocumentId { id } if id == "a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stats_by_type() {
        let store = store();
        store.add_document(policy_doc("a", "uno")).unwrap();
        store.add_document(policy_doc("b", "dos")).unwrap();
        store
            .add_document(Document::new("c", "tres").with_metadata("type", "invoice"))
            .unwrap();
        store.add_document(Document::new("d", "cuatro")).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_documents, 4);
        assert_eq!(stats.by_type.get("policy"), Some(&2));
        assert_eq!(stats.by_type.get("invoice"), Some(&1));
        assert_eq!(stats.by_type.get("unknown"), Some(&1));
    }

    #[tokio::test]
    async fn test_basic_search_scans_content_and_metadata() {
        let store = store();
        store
            .add_document(policy_doc("a", "Política de CONTRASEÑAS corporativas"))
            .unwrap();
        store
            .add_document(policy_doc("b", "registro de visitas"))
            .unwrap();

        // case-insensitive content match
        let hits = store.search("contraseñas", EngineKind::Basic).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");

        // filename lives in metadata and is searchable too
        let hits = store.search("b.pdf", EngineKind::Basic).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");

        let hits = store.search("no aparece", EngineKind::Basic).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_basic_search_preserves_insertion_order() {
        let store = store();
        store.add_document(policy_doc("z", "acceso remoto")).unwrap();
        store.add_document(policy_doc("a", "acceso local")).unwrap();

        let hits = store.search("acceso", EngineKind::Basic).await;
        let ids: Vec<&str> = hits.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[tokio::test]
    async fn test_search_on_empty_store() {
        let store = store();
        assert!(store.search("algo", EngineKind::Basic).await.is_empty());
        assert!(store.search("algo", EngineKind::Lexical).await.is_empty());
        assert!(store.search("algo", EngineKind::Semantic).await.is_empty());
    }

    #[tokio::test]
    async fn test_lexical_search_ranks_documents() {
        let store = store();
        store
            .add_document(policy_doc(
                "a",
                "contraseña contraseña contraseña contraseña contraseña segura",
            ))
            .unwrap();
        store
            .add_document(policy_doc("b", "cambiar la contraseña cada noventa días"))
            .unwrap();
        store
            .add_document(policy_doc("c", "registro de visitas al centro de datos"))
            .unwrap();
        store
            .add_document(policy_doc("d", "inventario anual del mobiliario"))
            .unwrap();
        store
            .add_document(policy_doc("e", "plan de continuidad operativa"))
            .unwrap();

        let hits = store.search("contraseña", EngineKind::Lexical).await;
        let ids: Vec<&str> = hits.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_semantic_search_returns_documents() {
        let store = store();
        store
            .add_document(policy_doc("a", "política de retención de datos"))
            .unwrap();
        store
            .add_document(policy_doc("b", "menú semanal del comedor"))
            .unwrap();

        let hits = store
            .search("política de retención de datos", EngineKind::Semantic)
            .await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_semantic_failure_falls_back_to_basic() {
        let store = CorpusStore::new(Arc::new(FailingProvider));
        store
            .add_document(policy_doc("a", "política de contraseñas"))
            .unwrap();
        store
            .add_document(policy_doc("b", "registro de visitas"))
            .unwrap();

        // the semantic build fails, but the caller still gets results
        let hits = store.search("contraseñas", EngineKind::Semantic).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_mutation_marks_index_stale() {
        let store = store();
        store
            .add_document(policy_doc("a", "norma de respaldo diario"))
            .unwrap();
        store
            .add_document(policy_doc("b", "registro de visitas"))
            .unwrap();
        store
            .add_document(policy_doc("c", "inventario de equipos"))
            .unwrap();
        store
            .add_document(policy_doc("e", "plan de continuidad operativa"))
            .unwrap();

        let hits = store.search("respaldo", EngineKind::Lexical).await;
        assert_eq!(hits.len(), 1);

        // a new document must be visible on the next query
        store
            .add_document(policy_doc("d", "respaldo incremental semanal"))
            .unwrap();
        let hits = store.search("respaldo", EngineKind::Lexical).await;
        let ids: Vec<&str> = hits.iter().map(|doc| doc.id.as_str()).collect();
        assert!(ids.contains(&"a"));
        assert!(ids.contains(&"d"));
    }

    #[tokio::test]
    async fn test_engine_stats_track_freshness() {
        let store = store();
        store
            .add_document(policy_doc("a", "norma de acceso físico"))
            .unwrap();
        store
            .add_document(policy_doc("b", "registro de visitas"))
            .unwrap();
        store
            .add_document(policy_doc("c", "plan de contingencia"))
            .unwrap();

        // nothing built yet
        let stats = store.engine_stats();
        assert!(stats.lexical.is_none());
        assert!(stats.semantic.is_none());

        store.search("acceso", EngineKind::Lexical).await;
        let stats = store.engine_stats();
        assert!(matches!(
            stats.lexical,
            Some(EngineStats::Lexical {
                total_documents: 3,
                ..
            })
        ));
        assert!(stats.semantic.is_none());

        // mutation makes the built engine stale again
        store
            .add_document(policy_doc("d", "auditoría externa"))
            .unwrap();
        assert!(store.engine_stats().lexical.is_none());
    }

    #[tokio::test]
    async fn test_store_benchmark_compares_both_engines() {
        let store = store();
        store
            .add_document(policy_doc("a", "control de acceso remoto seguro"))
            .unwrap();
        store
            .add_document(policy_doc("b", "registro de visitas"))
            .unwrap();
        store
            .add_document(policy_doc("c", "plan de contingencia"))
            .unwrap();

        let report = store.benchmark("acceso", DEFAULT_ITERATIONS).await;
        assert_eq!(report.lexical.timings_ms.len(), DEFAULT_ITERATIONS);
        assert_eq!(report.semantic.timings_ms.len(), DEFAULT_ITERATIONS);
        assert!(report.comparison.is_some());
    }
}
