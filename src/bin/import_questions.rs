//! One-shot batch import of per-company question datasets.
//!
//! Usage: `import-questions [data-dir]` (defaults to $QUESTION_DATA_DIR,
//! then `data/company-questions`). Bad records and malformed files are
//! tallied and reported; the run only fails outright when there is no input
//! at all or the store is unreachable.

use std::path::Path;

use anyhow::{bail, Context};
use log::{error, info, warn};

use codequest::database::DatabaseManager;
use codequest::importer::{self, Importer};
use codequest::AppConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("❌ Import failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let data_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QUESTION_DATA_DIR").ok())
        .unwrap_or_else(|| "data/company-questions".to_string());

    info!("🚀 Starting question import from {}", data_dir);

    let batches = importer::read_batch_dir(Path::new(&data_dir))
        .with_context(|| format!("cannot read data directory {}", data_dir))?;
    if batches.is_empty() {
        bail!("no JSON batch files found in {}", data_dir);
    }
    info!("📁 Found {} batch files", batches.len());

    let config = AppConfig::from_env();
    let db = DatabaseManager::connect(&config)?;
    db.initialize()
        .await
        .context("persistence layer unreachable")?;

    let mut importer = Importer::new();
    for (source, payload) in &batches {
        importer.ingest_json(source, payload);
    }
    let (questions, mut report) = importer.finish();

    let (inserted, updated) = importer::apply(&db, &questions)
        .await
        .context("applying merged questions to the store")?;
    report.inserted = inserted;
    report.updated = updated;

    info!("📊 Import complete");
    info!("  Batches:            {}", report.batches);
    info!("  Records processed:  {}", report.processed);
    info!("  Records skipped:    {}", report.skipped);
    info!("  Unique questions:   {}", report.unique);
    info!("  Inserted:           {}", report.inserted);
    info!("  Updated:            {}", report.updated);
    for batch_error in &report.batch_errors {
        warn!("  ⚠️ {}: {}", batch_error.source, batch_error.error);
    }

    let total = db.count_questions().await?;
    info!("✅ {} questions now in the database", total);

    Ok(())
}
