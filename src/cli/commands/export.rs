//! Export command implementations.
//!
//! All four scope commands share one flow: guard or extend the state file,
//! resolve the scope to the page ids it covers, then export every page
//! with progressive state saves. The recorded scope is what `cme sync`
//! replays later.

use std::path::Path;

use crate::cli::progress::{bar_progress, make_progress_bar, make_spinner};
use crate::cli::ExportOpts;
use crate::config::Config;
use crate::confluence::{Client, ConfluenceApi};
use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::state::{ExportState, ScopeCommand, ScopeEntry, STATE_FILENAME};
use crate::sync::export_batch;

/// Execute `cme pages`.
pub fn pages(page_ids: &[u64], opts: &ExportOpts, output: Option<&Path>) -> Result<()> {
    run(
        ScopeCommand::Pages,
        page_ids.iter().map(u64::to_string).collect(),
        opts,
        output,
    )
}

/// Execute `cme pages-with-descendants`.
pub fn pages_with_descendants(
    page_ids: &[u64],
    opts: &ExportOpts,
    output: Option<&Path>,
) -> Result<()> {
    run(
        ScopeCommand::PagesWithDescendants,
        page_ids.iter().map(u64::to_string).collect(),
        opts,
        output,
    )
}

/// Execute `cme spaces`.
pub fn spaces(space_keys: &[String], opts: &ExportOpts, output: Option<&Path>) -> Result<()> {
    run(ScopeCommand::Spaces, space_keys.to_vec(), opts, output)
}

/// Execute `cme all-spaces`.
pub fn all_spaces(opts: &ExportOpts, output: Option<&Path>) -> Result<()> {
    run(ScopeCommand::AllSpaces, Vec::new(), opts, output)
}

fn run(
    command: ScopeCommand,
    args: Vec<String>,
    opts: &ExportOpts,
    output: Option<&Path>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(command, args, opts, output))
}

async fn run_async(
    command: ScopeCommand,
    args: Vec<String>,
    opts: &ExportOpts,
    output: Option<&Path>,
) -> Result<()> {
    let config = Config::from_env()?;
    let output_dir = super::resolve_output_dir(output);

    let mut state = load_or_create_state(
        &output_dir,
        opts.append,
        &config.base_url,
        ScopeEntry::new(command, args.clone()),
    )?;

    let client = Client::new(&config);

    let spinner = make_spinner(command.as_str());
    spinner.set_message("resolving pages...");
    let page_ids = scope_page_ids(&client, command, &args).await?;
    spinner.finish_and_clear();

    println!(
        "Exporting {} page(s) to {}",
        page_ids.len(),
        output_dir.display()
    );

    let mut exporter = Exporter::new(&client, output_dir.clone());
    if opts.use_lockfile {
        exporter = exporter.with_lockfile();
    }

    let pb = make_progress_bar(page_ids.len() as u64, command.as_str());
    let progress = bar_progress(&pb);
    let stats = export_batch(&mut exporter, &page_ids, &mut state, Some(&progress)).await?;
    pb.finish_and_clear();

    // Persists the scope even when the batch was empty.
    state.save(&output_dir)?;

    if opts.clean {
        let removed = exporter.cleanup_untracked(false)?;
        if !removed.is_empty() {
            println!("Removed {} untracked file(s)", removed.len());
        }
    }

    if stats.inaccessible > 0 {
        println!(
            "Exported {} page(s), {} inaccessible",
            stats.exported, stats.inaccessible
        );
    } else {
        println!("Exported {} page(s)", stats.exported);
    }
    Ok(())
}

/// Load the state file honoring the append guard, or start fresh.
///
/// A fresh export refuses to run on top of an existing state file unless
/// `--append` was given. Appending validates that the state belongs to the
/// configured Confluence instance before recording the new scope. Nothing
/// is written here; the first progressive save during export persists the
/// scope.
fn load_or_create_state(
    output_dir: &Path,
    append: bool,
    confluence_url: &str,
    scope: ScopeEntry,
) -> Result<ExportState> {
    let mut state = match ExportState::load(output_dir)? {
        Some(mut existing) => {
            if !append {
                return Err(Error::StateExists {
                    path: output_dir.join(STATE_FILENAME),
                });
            }
            existing.validate_source(confluence_url, false)?;
            existing
        }
        None => ExportState::new(confluence_url),
    };
    state.add_scope(scope);
    Ok(state)
}

/// Resolve a scope to the page ids it covers right now.
///
/// Overlapping arguments can yield duplicate ids; exporting a page twice
/// is idempotent, so the list is not deduplicated.
async fn scope_page_ids<A: ConfluenceApi>(
    api: &A,
    command: ScopeCommand,
    args: &[String],
) -> Result<Vec<String>> {
    match command {
        ScopeCommand::Pages => Ok(args.to_vec()),
        ScopeCommand::PagesWithDescendants => {
            let mut ids = Vec::new();
            for id in args {
                ids.push(id.clone());
                ids.extend(api.descendant_ids(id).await?);
            }
            Ok(ids)
        }
        ScopeCommand::Spaces => {
            let mut ids = Vec::new();
            for key in args {
                ids.extend(api.space_page_ids(key).await?);
            }
            Ok(ids)
        }
        ScopeCommand::AllSpaces => {
            let mut ids = Vec::new();
            for space in api.all_spaces().await? {
                ids.extend(api.space_page_ids(&space.key).await?);
            }
            Ok(ids)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confluence::fake::FakeApi;
    use tempfile::TempDir;

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    fn scope(command: ScopeCommand, args: &[&str]) -> ScopeEntry {
        ScopeEntry::new(command, args.iter().map(|s| (*s).to_string()).collect())
    }

    const URL: &str = "https://test.atlassian.net";

    #[test]
    fn fresh_run_creates_state_with_scope() {
        let dir = TempDir::new().unwrap();
        let state =
            load_or_create_state(dir.path(), false, URL, scope(ScopeCommand::Pages, &["1"]))
                .unwrap();

        assert_eq!(state.confluence_url, URL);
        assert_eq!(state.scopes, vec![scope(ScopeCommand::Pages, &["1"])]);
    }

    #[test]
    fn guard_refuses_existing_state_without_append() {
        let dir = TempDir::new().unwrap();
        ExportState::new(URL).save(dir.path()).unwrap();

        let err = load_or_create_state(dir.path(), false, URL, scope(ScopeCommand::Pages, &["1"]))
            .unwrap_err();
        assert!(matches!(err, Error::StateExists { .. }));
    }

    #[test]
    fn append_extends_existing_state() {
        let dir = TempDir::new().unwrap();
        let mut existing = ExportState::new(URL);
        existing.add_scope(scope(ScopeCommand::Spaces, &["ENG"]));
        existing.save(dir.path()).unwrap();

        let state =
            load_or_create_state(dir.path(), true, URL, scope(ScopeCommand::Pages, &["1"]))
                .unwrap();
        assert_eq!(state.scopes.len(), 2);

        // Re-appending an identical scope is a no-op.
        let state =
            load_or_create_state(dir.path(), true, URL, scope(ScopeCommand::Spaces, &["ENG"]))
                .unwrap();
        assert_eq!(state.scopes.len(), 1);
    }

    #[test]
    fn append_rejects_different_instance() {
        let dir = TempDir::new().unwrap();
        ExportState::new("https://other.atlassian.net")
            .save(dir.path())
            .unwrap();

        let err = load_or_create_state(dir.path(), true, URL, scope(ScopeCommand::Pages, &["1"]))
            .unwrap_err();
        assert!(matches!(err, Error::SourceMismatch { .. }));
    }

    #[test]
    fn scope_pages_passes_ids_through() {
        let api = FakeApi::new();
        let ids = block_on(scope_page_ids(
            &api,
            ScopeCommand::Pages,
            &["1".to_string(), "2".to_string()],
        ))
        .unwrap();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn scope_descendants_walks_each_root() {
        let mut api = FakeApi::new();
        api.descendants
            .insert("1".to_string(), vec!["10".to_string(), "11".to_string()]);

        let ids = block_on(scope_page_ids(
            &api,
            ScopeCommand::PagesWithDescendants,
            &["1".to_string(), "2".to_string()],
        ))
        .unwrap();
        assert_eq!(ids, vec!["1", "10", "11", "2"]);
    }

    #[test]
    fn scope_spaces_resolves_homepage_trees() {
        let mut api = FakeApi::new();
        api.add_space("ENG", "Engineering", Some("100"));
        api.descendants
            .insert("100".to_string(), vec!["101".to_string()]);

        let ids = block_on(scope_page_ids(
            &api,
            ScopeCommand::Spaces,
            &["ENG".to_string()],
        ))
        .unwrap();
        assert_eq!(ids, vec!["100", "101"]);
    }

    #[test]
    fn scope_all_spaces_covers_the_organization() {
        let mut api = FakeApi::new();
        api.add_space("ENG", "Engineering", Some("100"));
        api.add_space("HR", "People", Some("200"));
        api.descendants
            .insert("200".to_string(), vec!["201".to_string()]);

        let ids = block_on(scope_page_ids(&api, ScopeCommand::AllSpaces, &[])).unwrap();
        assert_eq!(ids, vec!["100", "200", "201"]);
    }
}
