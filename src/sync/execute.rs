//! Delta application.
//!
//! Exports every page the delta marks as needing it and deletes the local
//! files of pages that vanished remotely. State is saved after every single
//! page and every single deletion, so a run killed halfway leaves a state
//! file that exactly describes what is on disk and the next sync picks up
//! from there. That progressive save is the crash-recovery mechanism; do
//! not batch it.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::confluence::ConfluenceApi;
use crate::error::Result;
use crate::export::{ExportOutcome, Exporter};
use crate::state::{ExportState, PageStatus, SyncDelta};

/// Progress callback: `(done, total, current item)`.
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Counts of what one sync run actually did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub exported: usize,
    pub deleted: usize,
    pub inaccessible: usize,
}

/// Apply a computed delta.
///
/// New, modified and stale pages are exported in that order. Pages gone
/// from the remote get their local file removed and their record
/// tombstoned. With `dry_run` nothing at all happens: no fetches, no
/// writes, no state changes.
///
/// # Errors
///
/// Fails on API errors other than per-page 403/404 and on filesystem
/// failures. State already saved before the failure remains valid.
pub async fn execute_sync<A: ConfluenceApi>(
    exporter: &mut Exporter<'_, A>,
    state: &mut ExportState,
    delta: &SyncDelta,
    dry_run: bool,
    progress: Option<&ProgressFn>,
) -> Result<SyncStats> {
    if dry_run {
        return Ok(SyncStats::default());
    }

    let to_export: Vec<String> = delta
        .new
        .iter()
        .chain(&delta.modified)
        .chain(&delta.stale)
        .cloned()
        .collect();

    let mut stats = export_batch(exporter, &to_export, state, progress).await?;
    stats.deleted = delete_pages(state, &delta.deleted, exporter.output_dir())?;
    Ok(stats)
}

/// Export a batch of pages, updating and saving state after each one.
///
/// Shared by the initial export commands and the sync executor. Pages the
/// API reports as inaccessible are counted but never written into state.
pub async fn export_batch<A: ConfluenceApi>(
    exporter: &mut Exporter<'_, A>,
    page_ids: &[String],
    state: &mut ExportState,
    progress: Option<&ProgressFn>,
) -> Result<SyncStats> {
    let mut stats = SyncStats::default();
    let output_dir = exporter.output_dir().to_path_buf();
    let total = page_ids.len() as u64;

    for (done, page_id) in page_ids.iter().enumerate() {
        if let Some(report) = progress {
            report(done as u64, total, page_id);
        }
        match exporter.export_page(page_id).await? {
            ExportOutcome::Exported {
                version,
                output_path,
            } => {
                state.update_page(page_id, version, &output_path);
                state.save(&output_dir)?;
                stats.exported += 1;
            }
            ExportOutcome::Inaccessible => {
                stats.inaccessible += 1;
            }
        }
    }
    if let Some(report) = progress {
        report(total, total, "");
    }
    Ok(stats)
}

/// Remove local files for pages that disappeared remotely and tombstone
/// their records, saving state after each page.
fn delete_pages(state: &mut ExportState, page_ids: &[String], output_dir: &Path) -> Result<usize> {
    if page_ids.is_empty() {
        return Ok(0);
    }
    let output_root = fs::canonicalize(output_dir)?;

    let mut deleted = 0;
    for page_id in page_ids {
        if let Some(record) = state.pages.get_mut(page_id) {
            // Resolve symlinks and dot segments before trusting the
            // recorded path. A record pointing outside the output tree is
            // tombstoned but its file is left alone.
            let candidate = output_dir.join(&record.output_path);
            if let Ok(resolved) = fs::canonicalize(&candidate) {
                if resolved.starts_with(&output_root) {
                    if resolved.is_file() {
                        fs::remove_file(&resolved)?;
                        info!(path = %resolved.display(), "Deleted orphan file");
                    }
                } else {
                    warn!(
                        path = %resolved.display(),
                        "Refusing to delete file outside the output directory"
                    );
                }
            }
            record.status = PageStatus::Deleted;
            deleted += 1;
        }
        state.save(output_dir)?;
    }
    Ok(deleted)
}
