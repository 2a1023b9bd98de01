//! Scope replay.
//!
//! A sync never re-walks the whole site. It re-runs the recorded scopes,
//! the commands and arguments the original exports were invoked with, and
//! asks Confluence only for current version numbers. The result is one map
//! of page id to version covering everything this state file is
//! responsible for.

use tracing::{info, warn};

use crate::confluence::ConfluenceApi;
use crate::error::{Error, Result};
use crate::state::{ExportState, ScopeCommand, ScopeEntry, VersionMap};
use crate::sync::execute::ProgressFn;

/// Version recorded when a page's current version cannot be read.
///
/// The delta engine treats any non-positive version as changed, so a page
/// behind a transient failure is re-fetched on this run rather than
/// silently skipped.
pub const SENTINEL_VERSION: i64 = 0;

/// Replay every recorded scope and merge the results.
///
/// Pages covered by more than one scope keep the highest positive version
/// seen. A sentinel from a failed fetch never displaces a real version.
/// The progress callback is fed `(done, total, page id)` per version
/// fetch; the total grows as each scope discovers its id list.
///
/// # Errors
///
/// Per-page version lookups degrade to the sentinel policy and never fail
/// the replay. Enumeration calls do fail it: a partial listing of a space
/// or subtree is indistinguishable from mass deletion, and aborting is the
/// safer answer.
pub async fn collect_remote_versions<A: ConfluenceApi>(
    api: &A,
    state: &ExportState,
    progress: Option<&ProgressFn>,
) -> Result<VersionMap> {
    let mut merged = VersionMap::new();
    let mut tracker = Tracker::new(progress);
    for scope in &state.scopes {
        let versions = replay_scope(api, scope, &mut tracker).await?;
        merge_versions(&mut merged, versions);
    }
    tracker.finish();
    Ok(merged)
}

async fn replay_scope<A: ConfluenceApi>(
    api: &A,
    scope: &ScopeEntry,
    tracker: &mut Tracker<'_>,
) -> Result<VersionMap> {
    let mut versions = VersionMap::new();
    match scope.command {
        ScopeCommand::Pages => {
            tracker.expect(scope.args.len());
            for id in &scope.args {
                tracker.starting(id);
                record_page(api, id, &mut versions).await;
            }
        }
        ScopeCommand::PagesWithDescendants => {
            tracker.expect(scope.args.len());
            for id in &scope.args {
                tracker.starting(id);
                // A subtree can only be enumerated through its root. When
                // the root is gone the whole subtree counts as gone; on any
                // other failure we abort rather than guess at the subtree.
                match fetch_root(api, id).await? {
                    Some(version) => {
                        versions.insert(id.to_string(), version);
                    }
                    None => continue,
                }
                let children = api.descendant_ids(id).await?;
                tracker.expect(children.len());
                for child in children {
                    tracker.starting(&child);
                    record_version(api, &child, &mut versions).await;
                }
            }
        }
        ScopeCommand::Spaces => {
            for key in &scope.args {
                let ids = api.space_page_ids(key).await?;
                tracker.expect(ids.len());
                for id in ids {
                    tracker.starting(&id);
                    record_version(api, &id, &mut versions).await;
                }
            }
        }
        ScopeCommand::AllSpaces => {
            for space in api.all_spaces().await? {
                let ids = api.space_page_ids(&space.key).await?;
                tracker.expect(ids.len());
                for id in ids {
                    tracker.starting(&id);
                    record_version(api, &id, &mut versions).await;
                }
            }
        }
    }
    Ok(versions)
}

/// Running tally behind the progress callback. Replay learns the id list
/// scope by scope, so the total is raised as discovery happens instead of
/// being known up front.
struct Tracker<'a> {
    progress: Option<&'a ProgressFn>,
    done: u64,
    total: u64,
}

impl<'a> Tracker<'a> {
    fn new(progress: Option<&'a ProgressFn>) -> Self {
        Self {
            progress,
            done: 0,
            total: 0,
        }
    }

    fn expect(&mut self, count: usize) {
        self.total += count as u64;
    }

    fn starting(&mut self, id: &str) {
        if let Some(report) = self.progress {
            report(self.done, self.total, id);
        }
        self.done += 1;
    }

    fn finish(&self) {
        if let Some(report) = self.progress {
            report(self.done, self.total, "");
        }
    }
}

/// Scope roots are fetched in full. Their records are needed for traversal
/// anyway, so a separate version-only call would be a second round trip.
async fn record_page<A: ConfluenceApi>(api: &A, id: &str, versions: &mut VersionMap) {
    match api.page(id).await {
        Ok(page) => {
            versions.insert(page.id.clone(), page.version);
        }
        Err(err) => note_failure(id, &err, versions),
    }
}

/// Fetch a subtree root, `None` when it answered 403/404.
async fn fetch_root<A: ConfluenceApi>(api: &A, id: &str) -> Result<Option<i64>> {
    match api.page(id).await {
        Ok(page) => Ok(Some(page.version)),
        Err(err) if err.is_access_denied() => {
            info!(page_id = id, "Subtree root no longer accessible, dropping subtree");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

async fn record_version<A: ConfluenceApi>(api: &A, id: &str, versions: &mut VersionMap) {
    match api.page_version(id).await {
        Ok(version) => {
            versions.insert(id.to_string(), version);
        }
        Err(err) => note_failure(id, &err, versions),
    }
}

/// 403/404 means the page is gone for us: leave it out of the map so the
/// delta engine classifies it as deleted. Anything else gets the sentinel.
fn note_failure(id: &str, err: &Error, versions: &mut VersionMap) {
    if err.is_access_denied() {
        info!(page_id = id, "Page no longer accessible, dropping from version map");
    } else {
        warn!(page_id = id, error = %err, "Version fetch failed, marking for re-export");
        versions.insert(id.to_string(), SENTINEL_VERSION);
    }
}

fn merge_versions(merged: &mut VersionMap, fresh: VersionMap) {
    for (id, version) in fresh {
        match merged.get(&id) {
            Some(_) if version <= 0 => {}
            Some(&existing) if version <= existing => {}
            _ => {
                merged.insert(id, version);
            }
        }
    }
}
