//! BM25 lexical ranking engine
//!
//! Classic term-frequency ranking over an inverted index. The whole index is
//! rebuilt from a corpus snapshot on every [`index`](SearchEngine::index)
//! call, so there is no incremental-update path to get wrong: either the
//! build completes and the new state replaces the old wholesale, or it fails
//! and nothing changes.

use crate::document::{Document, SearchResult};
use crate::engine::{EngineStats, SearchEngine};
use crate::error::{Result, SearchError};
use crate::tokenizer::tokenize;
use async_trait::async_trait;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// BM25 tuning parameters.
///
/// The defaults (`k1 = 1.5`, `b = 0.75`) are the standard operating point:
/// `k1` controls how quickly repeated occurrences of a term saturate, `b`
/// controls how strongly long documents are penalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter
    pub k1: f32,
    /// Document-length normalization strength, in [0, 1]
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Lexical search engine ranking documents with BM25.
///
/// Holds an inverted term index plus per-document lengths over the corpus
/// snapshot it was last built from. Query-side and index-side text go through
/// the same [`tokenize`] pipeline.
///
/// Terms occurring in every document get a negative IDF and reduce a
/// document's total score; that is standard BM25 behavior and is preserved
/// here, not clamped. Documents whose total score ends up at or below zero
/// are excluded from results.
pub struct LexicalIndex {
    params: Bm25Params,
    corpus: Arc<[Document]>,
    /// term → (document id → occurrences of the term in that document)
    term_doc_frequency: HashMap<String, HashMap<String, usize>>,
    /// document id → token count after normalization
    doc_length: HashMap<String, usize>,
    avg_doc_length: f32,
    total_docs: usize,
    built: bool,
}

impl LexicalIndex {
    /// Create an engine with the given BM25 parameters. No index exists until
    /// [`index`](SearchEngine::index) runs.
    pub fn new(params: Bm25Params) -> Self {
        Self {
            params,
            corpus: Arc::from(vec![]),
            term_doc_frequency: HashMap::new(),
            doc_length: HashMap::new(),
            avg_doc_length: 0.0,
            total_docs: 0,
            built: false,
        }
    }

    /// BM25 score of one document against the query terms.
    ///
    /// Only terms actually present in the document contribute. Returns the
    /// raw sum; the caller drops non-positive totals.
    fn score_document(&self, doc_id: &str, query_terms: &[String]) -> f32 {
        let doc_length = self.doc_length.get(doc_id).copied().unwrap_or(0) as f32;
        let mut score = 0.0f32;

        for term in query_terms {
            let Some(postings) = self.term_doc_frequency.get(term) else {
                continue;
            };
            let term_freq = postings.get(doc_id).copied().unwrap_or(0) as f32;
            let doc_freq = postings.len() as f32;
            if term_freq == 0.0 {
                continue;
            }

            let idf =
                ((self.total_docs as f32 - doc_freq + 0.5) / (doc_freq + 0.5)).ln();
            let numerator = term_freq * (self.params.k1 + 1.0);
            let denominator = term_freq
                + self.params.k1
                    * (1.0 - self.params.b
                        + self.params.b * (doc_length / self.avg_doc_length));

            score += idf * (numerator / denominator);
        }

        score
    }
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

impl std::fmt::Debug for LexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalIndex")
            .field("params", &self.params)
            .field("total_docs", &self.total_docs)
            .field("total_terms", &self.term_doc_frequency.len())
            .field("built", &self.built)
            .finish()
    }
}

#[async_trait]
impl SearchEngine for LexicalIndex {
    async fn index(&mut self, documents: Arc<[Document]>) -> Result<()> {
        let mut term_doc_frequency: HashMap<String, HashMap<String, usize>> = HashMap::new();
        let mut doc_length: HashMap<String, usize> = HashMap::new();
        let mut seen_ids: HashSet<&str> = HashSet::with_capacity(documents.len());

        for doc in documents.iter() {
            if !seen_ids.insert(&doc.id) {
                return Err(SearchError::duplicate_id(doc.id.as_str()));
            }

            let terms = tokenize(&doc.content);
            doc_length.insert(doc.id.clone(), terms.len());

            let mut term_count: HashMap<String, usize> = HashMap::new();
            for term in terms {
                *term_count.entry(term).or_insert(0) += 1;
            }
            for (term, freq) in term_count {
                term_doc_frequency
                    .entry(term)
                    .or_default()
                    .insert(doc.id.clone(), freq);
            }
        }

        let total_docs = documents.len();
        let total_length: usize = doc_length.values().sum();
        let avg_doc_length = if total_docs > 0 {
            total_length as f32 / total_docs as f32
        } else {
            0.0
        };

        tracing::debug!(
            total_docs,
            total_terms = term_doc_frequency.len(),
            avg_doc_length,
            "built lexical index"
        );

        self.corpus = documents;
        self.term_doc_frequency = term_doc_frequency;
        self.doc_length = doc_length;
        self.avg_doc_length = avg_doc_length;
        self.total_docs = total_docs;
        self.built = true;

        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Ok(vec![]);
        }

        let results = self
            .corpus
            .iter()
            .map(|doc| (doc, self.score_document(&doc.id, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
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
        EngineStats::Lexical {
            total_documents: self.total_docs,
            total_terms: self.term_doc_frequency.len(),
            avg_doc_length: self.avg_doc_length,
            k1: self.params.k1,
            b: self.params.b,
        }
    }

    fn is_built(&self) -> bool {
        self.built
    }
}
