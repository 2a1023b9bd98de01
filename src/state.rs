//! State file model and persistence for incremental sync.
//!
//! Tracks exported page versions, scopes, and timestamps so subsequent
//! runs only re-export pages that changed since the last one. The state
//! lives in a single JSON dotfile inside the export output directory and
//! is always written atomically (temp file + rename).

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Well-known state filename inside the export output directory.
pub const STATE_FILENAME: &str = ".cme-state.json";

/// Current state file schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Mapping of page id to its current remote version number.
///
/// A value of `0` is the sentinel for "version unknown due to a transient
/// error" and always forces a re-export.
pub type VersionMap = BTreeMap<String, i64>;

// ── Models ────────────────────────────────────────────────────

/// Whether a tracked page still exists remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Active,
    Deleted,
}

/// Export state of a single Confluence page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Confluence page version number at time of export.
    pub version: i64,
    /// UTC timestamp of when this page was last exported.
    pub last_exported: DateTime<Utc>,
    /// Relative path to the exported markdown file.
    pub output_path: String,
    /// Whether the page is active or has been deleted remotely.
    pub status: PageStatus,
}

/// The export command kind recorded in a scope.
///
/// Closed set: the replayer matches exhaustively, so adding a kind is a
/// compile-time checked extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeCommand {
    Pages,
    PagesWithDescendants,
    Spaces,
    AllSpaces,
}

impl ScopeCommand {
    /// CLI-facing name of the command.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Pages => "pages",
            Self::PagesWithDescendants => "pages-with-descendants",
            Self::Spaces => "spaces",
            Self::AllSpaces => "all-spaces",
        }
    }
}

/// Which CLI command and arguments produced (part of) an export.
///
/// Identity is structural: two entries with the same command and args are
/// the same scope and are never stored twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeEntry {
    pub command: ScopeCommand,
    pub args: Vec<String>,
}

impl ScopeEntry {
    #[must_use]
    pub fn new(command: ScopeCommand, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

/// Top-level state model persisted to `.cme-state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportState {
    /// State file schema version, for future migrations.
    pub schema_version: u32,
    /// The Confluence instance URL this state belongs to.
    pub confluence_url: String,
    /// Export scopes (command + args) that produced this state.
    pub scopes: Vec<ScopeEntry>,
    /// When set, pages exported before this time are considered stale and
    /// will be re-exported (set by `sync --force`).
    #[serde(default)]
    pub min_export_timestamp: Option<DateTime<Utc>>,
    /// Map of page id to record for all tracked pages, tombstones included.
    #[serde(default)]
    pub pages: BTreeMap<String, PageRecord>,
}

impl ExportState {
    /// Fresh state for a Confluence instance with no scopes or pages yet.
    #[must_use]
    pub fn new(confluence_url: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            confluence_url: confluence_url.into(),
            scopes: Vec::new(),
            min_export_timestamp: None,
            pages: BTreeMap::new(),
        }
    }

    /// Load export state from the output directory.
    ///
    /// Returns `None` if no state file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptState`] if the file exists but cannot be
    /// parsed against the schema, and [`Error::Io`] on read failures.
    pub fn load(output_dir: &Path) -> Result<Option<Self>> {
        let state_file = output_dir.join(STATE_FILENAME);
        let raw = match fs::read_to_string(&state_file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state = serde_json::from_str(&raw).map_err(|e| Error::CorruptState {
            path: state_file,
            reason: e.to_string(),
        })?;
        Ok(Some(state))
    }

    /// Save export state to the output directory atomically.
    ///
    /// Writes indented JSON to a temporary file in the same directory, then
    /// renames it over the canonical file. On any failure the temporary file
    /// is removed and the canonical file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write or rename failures.
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir)?;
        let target = output_dir.join(STATE_FILENAME);
        let tmp = output_dir.join(format!("{STATE_FILENAME}.tmp"));

        let result = write_then_rename(&tmp, &target, self);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Update or add the record for a page after a successful export.
    ///
    /// Always sets the status to active and stamps `last_exported` with the
    /// current UTC time. This is the only mutation path for page records
    /// outside of deletion handling, and it is designed to be called once
    /// per page during progressive state writes.
    pub fn update_page(&mut self, page_id: &str, version: i64, output_path: &str) {
        self.pages.insert(
            page_id.to_string(),
            PageRecord {
                version,
                last_exported: Utc::now(),
                output_path: output_path.to_string(),
                status: PageStatus::Active,
            },
        );
    }

    /// Record a scope unless an identical one is already present.
    pub fn add_scope(&mut self, scope: ScopeEntry) {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
    }

    /// Validate that this state belongs to the given Confluence instance.
    ///
    /// URLs are compared with trailing slashes stripped. With `allow_update`
    /// set, a mismatch rewrites the stored URL instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceMismatch`] when the URLs differ and
    /// `allow_update` is false.
    pub fn validate_source(&mut self, current_url: &str, allow_update: bool) -> Result<()> {
        if self.confluence_url.trim_end_matches('/') == current_url.trim_end_matches('/') {
            return Ok(());
        }
        if allow_update {
            self.confluence_url = current_url.to_string();
            return Ok(());
        }
        Err(Error::SourceMismatch {
            stored: self.confluence_url.clone(),
            current: current_url.to_string(),
        })
    }

    /// Count of tracked pages with the given status.
    #[must_use]
    pub fn count_pages(&self, status: PageStatus) -> usize {
        self.pages.values().filter(|p| p.status == status).count()
    }
}

fn write_then_rename(tmp: &Path, target: &Path, state: &ExportState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let file = fs::File::create(tmp)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(json.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(tmp, target)?;
    Ok(())
}

// ── Delta ─────────────────────────────────────────────────────

/// Result of comparing current remote pages against stored state.
///
/// The five buckets are disjoint: every page id lands in exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncDelta {
    /// In the current version map but not tracked (or only as a tombstone).
    pub new: Vec<String>,
    /// Remote version is higher than the stored one, or is the sentinel.
    pub modified: Vec<String>,
    /// Version matches but the export predates `min_export_timestamp`.
    pub stale: Vec<String>,
    /// Tracked as active but no longer present remotely.
    pub deleted: Vec<String>,
    /// Version matches and the export is recent enough.
    pub unchanged: Vec<String>,
}

impl SyncDelta {
    /// Whether the delta requires any exports or deletions.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.new.is_empty()
            && self.modified.is_empty()
            && self.stale.is_empty()
            && self.deleted.is_empty())
    }
}

/// Compute the delta between stored state and the current version map.
///
/// Categorizes every page into one of five buckets:
/// - `new`: in `current` but not in state (tombstoned pages count as new
///   again on re-appearance)
/// - `modified`: in both, but the current version is higher than the stored
///   one, or the current version is the transient-error sentinel
/// - `stale`: in both, versions match, but `last_exported` predates
///   `min_export_timestamp`
/// - `deleted`: active in state but absent from `current`
/// - `unchanged`: in both, versions match, export is recent enough
///
/// Pages already marked deleted in state are never reconsidered.
#[must_use]
pub fn compute_delta(state: &ExportState, current: &VersionMap) -> SyncDelta {
    let mut delta = SyncDelta::default();

    for (page_id, &current_version) in current {
        let record = state.pages.get(page_id);

        let Some(record) = record else {
            delta.new.push(page_id.clone());
            continue;
        };
        if record.status == PageStatus::Deleted {
            delta.new.push(page_id.clone());
            continue;
        }

        if current_version <= 0 {
            // Sentinel from a transient fetch failure: force re-export.
            delta.modified.push(page_id.clone());
            continue;
        }

        if current_version > record.version {
            delta.modified.push(page_id.clone());
            continue;
        }

        // Version matches, check staleness against the force threshold.
        if let Some(threshold) = state.min_export_timestamp {
            if record.last_exported < threshold {
                delta.stale.push(page_id.clone());
                continue;
            }
        }

        delta.unchanged.push(page_id.clone());
    }

    // Active in state but absent remotely means the page was deleted.
    for (page_id, record) in &state.pages {
        if record.status == PageStatus::Deleted {
            continue;
        }
        if !current.contains_key(page_id) {
            delta.deleted.push(page_id.clone());
        }
    }

    delta
}
