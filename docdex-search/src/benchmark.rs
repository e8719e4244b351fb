//! Timed comparison of the two ranking engines
//!
//! [`RetrievalBenchmark`] drives identical queries through both engines,
//! records wall-clock time per run, and reports aggregate statistics plus
//! which engine averaged faster. Engines are built before the timed loop so
//! indexing cost never pollutes query timings, and a failing engine produces
//! an empty timing sequence instead of aborting the other engine's
//! measurement.

use crate::document::{Document, SearchResult};
use crate::engine::{EngineKind, SearchEngine};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Query repetitions per engine when the caller has no preference.
pub const DEFAULT_ITERATIONS: usize = 5;

/// Fixed per-search result limit used inside the timed loop.
pub const BENCHMARK_SEARCH_LIMIT: usize = 10;

/// Aggregate statistics over one engine's timing sequence.
///
/// All zeros when the engine produced no timings (build or search failure,
/// or zero iterations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    /// Number of hits in the representative sample
    pub result_count: usize,
}

impl RunStats {
    fn from_timings(timings_ms: &[f64], result_count: usize) -> Self {
        if timings_ms.is_empty() {
            return Self {
                avg_ms: 0.0,
                min_ms: 0.0,
                max_ms: 0.0,
                result_count,
            };
        }

        let avg_ms = timings_ms.iter().sum::<f64>() / timings_ms.len() as f64;
        let (min_ms, max_ms) = timings_ms
            .iter()
            .copied()
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));

        Self {
            avg_ms,
            min_ms,
            max_ms,
            result_count,
        }
    }
}

/// One engine's measured runs for a single benchmarked query.
///
/// The sample holds the first run's result set; later runs are timing-only
/// since both engines are read-only at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRun {
    pub engine: EngineKind,
    pub timings_ms: Vec<f64>,
    pub sample: Vec<SearchResult>,
    pub stats: RunStats,
}

impl EngineRun {
    fn empty(engine: EngineKind) -> Self {
        Self {
            engine,
            timings_ms: vec![],
            sample: vec![],
            stats: RunStats::from_timings(&[], 0),
        }
    }

    fn succeeded(&self) -> bool {
        !self.timings_ms.is_empty()
    }
}

/// Which engine averaged faster and by how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub faster: EngineKind,
    /// Absolute difference of average times. When only one engine produced
    /// timings this degenerates to that engine's average.
    pub time_difference_ms: f64,
}

/// Outcome of one [`RetrievalBenchmark::compare`] call. Immutable once
/// returned; the reporting side serializes it as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub query: String,
    pub lexical: EngineRun,
    pub semantic: EngineRun,
    /// Absent only when both engines failed to produce timings
    pub comparison: Option<Comparison>,
}

/// Drives repeated timed queries against both engines over one corpus
/// snapshot.
pub struct RetrievalBenchmark {
    lexical: Box<dyn SearchEngine>,
    semantic: Box<dyn SearchEngine>,
    corpus: Arc<[Document]>,
}

impl RetrievalBenchmark {
    /// Wrap two engines and the corpus snapshot they will be built from.
    /// Engines may arrive already built; any that is not gets built inside
    /// [`compare`](Self::compare), outside the timed region.
    pub fn new(
        lexical: Box<dyn SearchEngine>,
        semantic: Box<dyn SearchEngine>,
        corpus: Arc<[Document]>,
    ) -> Self {
        Self {
            lexical,
            semantic,
            corpus,
        }
    }

    /// Run `query` through both engines `iterations` times each and report
    /// the timings. [`DEFAULT_ITERATIONS`] is the conventional count.
    pub async fn compare(&mut self, query: &str, iterations: usize) -> BenchmarkReport {
        let lexical = Self::run_engine(
            self.lexical.as_mut(),
            EngineKind::Lexical,
            &self.corpus,
            query,
            iterations,
        )
        .await;
        let semantic = Self::run_engine(
            self.semantic.as_mut(),
            EngineKind::Semantic,
            &self.corpus,
            query,
            iterations,
        )
        .await;

        let comparison = match (lexical.succeeded(), semantic.succeeded()) {
            (true, true) => Some(Comparison {
                faster: if lexical.stats.avg_ms < semantic.stats.avg_ms {
                    EngineKind::Lexical
                } else {
                    EngineKind::Semantic
                },
                time_difference_ms: (lexical.stats.avg_ms - semantic.stats.avg_ms).abs(),
            }),
            (true, false) => Some(Comparison {
                faster: EngineKind::Lexical,
                time_difference_ms: lexical.stats.avg_ms,
            }),
            (false, true) => Some(Comparison {
                faster: EngineKind::Semantic,
                time_difference_ms: semantic.stats.avg_ms,
            }),
            (false, false) => None,
        };

        BenchmarkReport {
            query: query.to_string(),
            lexical,
            semantic,
            comparison,
        }
    }

    /// Build (if needed) and time one engine. Failures produce an empty run.
    async fn run_engine(
        engine: &mut dyn SearchEngine,
        kind: EngineKind,
        corpus: &Arc<[Document]>,
        query: &str,
        iterations: usize,
    ) -> EngineRun {
        if !engine.is_built() {
            if let Err(err) = engine.index(corpus.clone()).await {
                tracing::warn!("{kind} engine build failed during benchmark: {err}");
                return EngineRun::empty(kind);
            }
        }

        let mut timings_ms = Vec::with_capacity(iterations);
        let mut sample = Vec::new();

        for iteration in 0..iterations {
            let start = Instant::now();
            match engine.search(query, BENCHMARK_SEARCH_LIMIT).await {
                Ok(results) => {
                    timings_ms.push(start.elapsed().as_secs_f64() * 1_000.0);
                    if iteration == 0 {
                        sample = results;
                    }
                }
                Err(err) => {
                    tracing::warn!("{kind} engine search failed during benchmark: {err}");
                    return EngineRun::empty(kind);
                }
            }
        }

        let result_count = sample.len();
        EngineRun {
            engine: kind,
            stats: RunStats::from_timings(&timings_ms, result_count),
            timings_ms,
            sample,
        }
    }
}
