//! Command handlers

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use vdb_core::AppConfig;
use vdb_ingest::{IngestReport, VectorStoreService};
use vdb_scaffold::{
    clean_directory, copy_essential_files, copy_recursive, delete_index_file, CopyReport,
    DeleteOutcome, ExclusionFilter,
};
use vdb_vector::VectorIndex;

/// Fresh rebuild: drop the stale index file, then initialize and ingest
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    remove_stale_index(config).await;

    let mut service = VectorStoreService::from_config(&config.store);
    service
        .init()
        .await
        .context("Error initializing vector store")?;
    let report = service
        .add_files_from_directory(&config.store.source_dir)
        .await
        .context("Error initializing vector store")?;

    print_ingest_summary(&config.store.source_dir, &report);
    println!("Vector store has been initialized with text files.");
    Ok(())
}

pub async fn ingest(config: &AppConfig, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        remove_stale_index(config).await;
    }

    let mut service = VectorStoreService::from_config(&config.store);
    service
        .init()
        .await
        .context("Error initializing vector store")?;
    let report = service
        .add_files_from_directory(&config.store.source_dir)
        .await
        .with_context(|| format!("Failed to ingest {}", config.store.source_dir.display()))?;

    print_ingest_summary(&config.store.source_dir, &report);
    Ok(())
}

pub async fn query(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let service = VectorStoreService::from_config(&config.store);
    let report = service.query(text, None).await?;
    println!("{report}");
    Ok(())
}

pub async fn stats(config: &AppConfig) -> anyhow::Result<()> {
    let service = VectorStoreService::from_config(&config.store);
    let index = service.index();

    println!("Index directory: {}", config.store.index_dir.display());
    if index.is_index_created().await? {
        println!("Items: {}", index.item_count().await?);
    } else {
        println!("Index has not been created.");
    }
    Ok(())
}

pub async fn scaffold_copy(config: &AppConfig, src: &Path, dest: &Path) -> anyhow::Result<()> {
    let filter = ExclusionFilter::from_config(&config.scaffold);
    let report = copy_recursive(src, dest, &filter).await?;
    print_copy_summary(&report);
    Ok(())
}

pub async fn scaffold_essentials(
    config: &AppConfig,
    src: &Path,
    dest: &Path,
) -> anyhow::Result<()> {
    let report = copy_essential_files(src, dest, &config.scaffold.essential_files).await;
    print_copy_summary(&report);
    Ok(())
}

pub async fn scaffold_clean(dir: &Path) -> anyhow::Result<()> {
    let removed = clean_directory(dir).await?;
    println!("Removed {removed} entries from {}", dir.display());
    Ok(())
}

async fn remove_stale_index(config: &AppConfig) {
    let stale = config.stale_index_file();
    // Deletions and failures are logged by the helper; neither stops the run.
    if delete_index_file(&stale).await == DeleteOutcome::NotFound {
        info!("No stale index at {}", stale.display());
    }
}

fn print_ingest_summary(root: &Path, report: &IngestReport) {
    println!(
        "Ingested {} files from {} in {} ms",
        report.files_added,
        root.display(),
        report.elapsed_ms
    );
    for skipped in &report.skipped {
        warn!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}

fn print_copy_summary(report: &CopyReport) {
    println!(
        "Copied {} files ({} excluded, {} missing, {} failed)",
        report.copied,
        report.excluded,
        report.missing.len(),
        report.failed.len()
    );
    if !report.is_clean() {
        for (path, reason) in &report.failed {
            warn!("Failed {}: {}", path.display(), reason);
        }
    }
}
