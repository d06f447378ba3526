//! Batch walker: discover inputs, fan them out to the item processor,
//! collect a summary
//!
//! One bad item never stops the batch. Every failure is logged and recorded
//! in the summary; only a missing input path aborts the run.

use crate::config::Config;
use crate::document::{self, DocumentKind};
use crate::error::DeskewError;
use crate::processor::{ItemProcessor, OutputArtifact};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Items with a recognized extension
    pub discovered: usize,
    pub succeeded: usize,
    /// Files ignored because of their extension
    pub skipped: usize,
    pub outputs: Vec<OutputArtifact>,
    pub failures: Vec<ItemFailure>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// One item that could not be corrected
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub name: String,
    pub message: String,
}

/// An item and the file it would be written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Default)]
struct Discovery {
    items: Vec<PathBuf>,
    skipped: usize,
}

/// Correct everything under `config.input_path`
pub async fn run(config: &Config) -> Result<BatchSummary, DeskewError> {
    let processor = Arc::new(ItemProcessor::new(config));
    run_with(config, processor).await
}

/// [`run`] with a caller-supplied processor
pub async fn run_with(
    config: &Config,
    processor: Arc<ItemProcessor>,
) -> Result<BatchSummary, DeskewError> {
    if !config.input_path.exists() {
        return Err(DeskewError::InputNotFound(config.input_path.clone()));
    }

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        DeskewError::WriteError(format!(
            "Failed to create {}: {}",
            config.output_dir.display(),
            e
        ))
    })?;

    let discovery = discover(&config.input_path, &config.output_dir);
    tracing::info!(
        "Found {} item(s) in {}",
        discovery.items.len(),
        config.input_path.display()
    );

    let mut summary = BatchSummary {
        discovered: discovery.items.len(),
        skipped: discovery.skipped,
        ..Default::default()
    };

    let timeout = config.item_timeout;
    let results: Vec<(PathBuf, Result<OutputArtifact, DeskewError>)> =
        stream::iter(discovery.items)
            .map(|path| {
                let processor = processor.clone();
                async move {
                    let result = process_item(processor, path.clone(), timeout).await;
                    (path, result)
                }
            })
            .buffer_unordered(config.jobs.max(1))
            .collect()
            .await;

    for (path, result) in results {
        let name = document::display_name(&path);
        match result {
            Ok(artifact) => {
                summary.succeeded += 1;
                summary.outputs.push(artifact);
            }
            Err(e) => summary.failures.push(ItemFailure {
                path,
                name,
                message: e.to_string(),
            }),
        }
    }

    tracing::info!(
        "Done: {} corrected, {} failed, {} skipped",
        summary.succeeded,
        summary.failed(),
        summary.skipped
    );

    Ok(summary)
}

/// Run one item on the blocking pool, reporting the outcome
async fn process_item(
    processor: Arc<ItemProcessor>,
    path: PathBuf,
    timeout: Option<Duration>,
) -> Result<OutputArtifact, DeskewError> {
    let name = document::display_name(&path);
    let abort = Arc::new(AtomicBool::new(false));

    let task = tokio::task::spawn_blocking({
        let abort = abort.clone();
        let path = path.clone();
        move || processor.process_with_abort(&path, &abort)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                // The worker keeps running until its next checkpoint
                abort.store(true, Ordering::SeqCst);
                return Err(report_failure(&name, DeskewError::Timeout(limit)));
            }
        },
        None => task.await,
    };

    let result = joined
        .map_err(|e| DeskewError::Internal(format!("Task panic: {}", e)))
        .and_then(|result| result);

    // Success is announced by the processor itself
    result.map_err(|e| report_failure(&name, e))
}

fn report_failure(name: &str, e: DeskewError) -> DeskewError {
    tracing::error!("Error {}: {}", name, e);
    e
}

/// Items that a run would process, without touching the output directory
pub fn plan(config: &Config) -> Result<Vec<PlannedItem>, DeskewError> {
    if !config.input_path.exists() {
        return Err(DeskewError::InputNotFound(config.input_path.clone()));
    }

    let discovery = discover(&config.input_path, &config.output_dir);
    Ok(discovery
        .items
        .into_iter()
        .map(|input| PlannedItem {
            output: document::output_path(&input, &config.output_dir),
            input,
        })
        .collect())
}

/// Write the summary as pretty-printed JSON
pub fn write_report(summary: &BatchSummary, path: &Path) -> Result<(), DeskewError> {
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|e| DeskewError::Internal(format!("Failed to serialize report: {}", e)))?;
    std::fs::write(path, json).map_err(|e| {
        DeskewError::WriteError(format!("Failed to write report {}: {}", path.display(), e))
    })
}

/// Collect processable items under `input`, sorted for stable reporting
fn discover(input: &Path, output_dir: &Path) -> Discovery {
    let mut discovery = Discovery::default();

    if input.is_file() {
        if DocumentKind::classify(input).is_some() {
            discovery.items.push(input.to_path_buf());
        } else {
            tracing::warn!("Skipping unsupported file {}", input.display());
            discovery.skipped += 1;
        }
        return discovery;
    }

    let excluded = output_dir.canonicalize().ok();
    walk(input, excluded.as_deref(), &mut discovery);
    discovery.items.sort();
    discovery
}

fn walk(dir: &Path, excluded: Option<&Path>, discovery: &mut Discovery) {
    if excluded.is_some() && dir.canonicalize().ok().as_deref() == excluded {
        tracing::debug!("Not descending into output directory {}", dir.display());
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            walk(&path, excluded, discovery);
        } else if path.is_file() {
            if DocumentKind::classify(&path).is_some() {
                discovery.items.push(path);
            } else {
                tracing::debug!("Skipping {}", path.display());
                discovery.skipped += 1;
            }
        }
    }
}
