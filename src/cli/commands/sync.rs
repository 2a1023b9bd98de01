//! Sync command implementation.
//!
//! Replays the recorded scopes against the live instance, prints the
//! delta report, then re-exports and deletes until the local tree matches.
//! `--dry-run` stops after the report.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::cli::progress::{bar_progress, make_progress_bar};
use crate::config::Config;
use crate::confluence::Client;
use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::state::{compute_delta, ExportState, STATE_FILENAME};
use crate::sync::{collect_remote_versions, execute_sync, render_report};

/// Execute `cme sync`.
pub fn execute(force: bool, dry_run: bool, output: Option<&Path>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(execute_async(force, dry_run, output))
}

async fn execute_async(force: bool, dry_run: bool, output: Option<&Path>) -> Result<()> {
    let output_dir = super::resolve_output_dir(output);

    let mut state = ExportState::load(&output_dir)?.ok_or_else(|| Error::NoState {
        path: output_dir.join(STATE_FILENAME),
    })?;

    let config = Config::from_env()?;

    // --force also permits pointing the existing tree at a renamed instance.
    state.validate_source(&config.base_url, force)?;
    if force {
        state.min_export_timestamp = Some(Utc::now());
    }

    let client = Client::new(&config);

    let check = make_progress_bar(0, "check");
    check.set_message("checking remote versions...");
    let check_progress = bar_progress(&check);
    let versions = collect_remote_versions(&client, &state, Some(&check_progress)).await?;
    check.finish_and_clear();

    let delta = compute_delta(&state, &versions);
    println!("{}", render_report(&delta, &state));

    if dry_run {
        return Ok(());
    }

    let mut exporter = Exporter::new(&client, output_dir.clone());
    let pb = make_progress_bar(0, "sync");
    let progress = bar_progress(&pb);
    let stats = execute_sync(&mut exporter, &mut state, &delta, false, Some(&progress)).await?;
    pb.finish_and_clear();

    // Persists URL updates and the forced threshold even when nothing changed.
    state.save(&output_dir)?;

    info!(
        exported = stats.exported,
        deleted = stats.deleted,
        inaccessible = stats.inaccessible,
        "Sync complete"
    );
    Ok(())
}
