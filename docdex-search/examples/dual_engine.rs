//! Demonstrates both ranking engines and the comparative benchmark over a
//! small Spanish-language corpus, using the deterministic hashing provider so
//! no model download is needed.
//!
//! Run with: cargo run --example dual_engine

use anyhow::Result;
use docdex_embed::HashingEmbeddingProvider;
use docdex_search::{CorpusStore, Document, EngineKind, DEFAULT_ITERATIONS};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let store = CorpusStore::new(Arc::new(HashingEmbeddingProvider::default()));

    let corpus = [
        (
            "pol-001",
            "contrasenas.pdf",
            "policy",
            "Política de contraseñas: longitud mínima de ocho caracteres, cambio \
             obligatorio cada noventa días y sin reutilización de las últimas cinco.",
        ),
        (
            "pol-002",
            "acceso-remoto.pdf",
            "policy",
            "Control de acceso remoto: autenticación multifactor obligatoria y \
             revisión trimestral de permisos por el responsable de seguridad.",
        ),
        (
            "proc-001",
            "retencion-datos.docx",
            "procedure",
            "Procedimiento de retención de datos personales: conservación máxima de \
             tres años tras la terminación de la relación contractual.",
        ),
        (
            "reg-001",
            "visitas.xlsx",
            "register",
            "Registro de visitas al centro de datos con identificación, hora de \
             entrada y acompañante asignado.",
        ),
        (
            "plan-001",
            "continuidad.pdf",
            "plan",
            "Plan de continuidad operativa: respaldos diarios incrementales y \
             restauración verificada cada semestre.",
        ),
    ];

    for (id, filename, doc_type, content) in corpus {
        store.add_document(
            Document::new(id, content)
                .with_metadata("filename", filename)
                .with_metadata("type", doc_type),
        )?;
    }

    let stats = store.stats();
    println!("Corpus: {} documents, {:?}", stats.total_documents, stats.by_type);

    for engine in [EngineKind::Lexical, EngineKind::Semantic, EngineKind::Basic] {
        let hits = store.search("acceso", engine).await;
        println!("\n[{engine}] \"acceso\" → {} hits", hits.len());
        for doc in &hits {
            println!("  {} ({})", doc.id, doc.metadata["filename"]);
        }
    }

    println!("\nEngine stats: {}", serde_json::to_string_pretty(&store.engine_stats())?);

    let report = store.benchmark("acceso", DEFAULT_ITERATIONS).await;
    if let Some(comparison) = &report.comparison {
        println!(
            "\nBenchmark \"{}\": {} faster by {:.3}ms (lexical avg {:.3}ms, semantic avg {:.3}ms)",
            report.query,
            comparison.faster,
            comparison.time_difference_ms,
            report.lexical.stats.avg_ms,
            report.semantic.stats.avg_ms,
        );
    }

    Ok(())
}
