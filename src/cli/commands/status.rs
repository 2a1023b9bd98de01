//! Status command implementation.
//!
//! Summarizes the state file without contacting Confluence, so it works
//! offline and needs no credentials.

use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::state::{ExportState, PageStatus};

/// Execute `cme status`.
pub fn execute(output: Option<&Path>) -> Result<()> {
    let output_dir = super::resolve_output_dir(output);

    let Some(state) = ExportState::load(&output_dir)? else {
        println!("No previous export found. Run an export command first.");
        return Ok(());
    };

    println!("{}", "Export Status".bold().underline());
    println!();
    println!("Confluence URL: {}", state.confluence_url);
    println!("Schema version: {}", state.schema_version);
    println!();

    println!("{}", "Scopes:".blue().bold());
    for scope in &state.scopes {
        let args = if scope.args.is_empty() {
            "(none)".to_string()
        } else {
            scope.args.join(" ")
        };
        println!("  {} {}", scope.command.as_str(), args);
    }
    println!();

    let active = state.count_pages(PageStatus::Active);
    let deleted = state.count_pages(PageStatus::Deleted);
    println!("{}", "Pages tracked:".blue().bold());
    println!("  Active:  {active}");
    println!("  Deleted: {deleted}");
    println!("  {}:   {}", "Total".bold(), active + deleted);

    if let Some(threshold) = state.min_export_timestamp {
        println!();
        println!("Force re-export before: {}", threshold.to_rfc3339());
    }

    println!();
    println!(
        "{}",
        "Run 'cme sync' to check for remote changes.".dimmed()
    );
    Ok(())
}
