//! Optional per-directory export lockfile.
//!
//! The lockfile lives next to the exported Markdown and remembers which page
//! version produced each file. Export commands can consult it to skip pages
//! whose content is already on disk, and to clean up Markdown files that no
//! tracked page produced anymore. It is a convenience cache for repeated
//! exports into the same directory and is entirely separate from the sync
//! state file.
//!
//! Unlike the state file it is written non-atomically: losing it costs one
//! re-export, nothing more.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Filename of the lockfile inside an output directory.
pub const LOCKFILE_FILENAME: &str = ".confluence-lock.json";

/// Current lockfile format version.
const LOCKFILE_VERSION: u32 = 1;

/// What the lockfile remembers about one exported page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub title: String,
    pub version: i64,
    pub export_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockData {
    lockfile_version: u32,
    /// When the lockfile was last written, not per page.
    #[serde(default)]
    last_export: Option<DateTime<Utc>>,
    #[serde(default)]
    pages: BTreeMap<String, LockEntry>,
}

impl LockData {
    fn fresh() -> Self {
        Self {
            lockfile_version: LOCKFILE_VERSION,
            last_export: None,
            pages: BTreeMap::new(),
        }
    }
}

/// Lockfile for one output directory.
pub struct Lockfile {
    path: PathBuf,
    root: PathBuf,
    data: LockData,
}

impl Lockfile {
    /// Open the lockfile in `output_dir`, starting fresh if it is missing.
    ///
    /// An unreadable or malformed lockfile is not fatal. The worst case is
    /// re-exporting pages that were already up to date, so it is logged and
    /// replaced.
    #[must_use]
    pub fn open(output_dir: &Path) -> Self {
        let path = output_dir.join(LOCKFILE_FILENAME);
        let data = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<LockData>(&raw) {
                Ok(data) => data,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Unreadable lockfile, starting fresh");
                    LockData::fresh()
                }
            },
            Err(_) => LockData::fresh(),
        };
        Self {
            path,
            root: output_dir.to_path_buf(),
            data,
        }
    }

    /// Whether a page needs exporting again.
    ///
    /// A page is skipped only when the lockfile has it at the same version
    /// and the same relative path. A title change moves the file, so a path
    /// difference forces a re-export even at an unchanged version.
    #[must_use]
    pub fn should_export(&self, page_id: &str, version: i64, export_path: &str) -> bool {
        match self.data.pages.get(page_id) {
            Some(entry) => entry.version != version || entry.export_path != export_path,
            None => true,
        }
    }

    /// Record a freshly exported page and persist the lockfile.
    pub fn record_page(
        &mut self,
        page_id: &str,
        title: &str,
        version: i64,
        export_path: &str,
    ) -> Result<()> {
        self.data.pages.insert(
            page_id.to_string(),
            LockEntry {
                title: title.to_string(),
                version,
                export_path: export_path.to_string(),
            },
        );
        self.save()
    }

    /// Number of tracked pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.pages.is_empty()
    }

    /// Delete Markdown files under the output directory that no tracked page
    /// produced. Returns the relative paths of the files it removed, or with
    /// `dry_run` the paths it would remove.
    pub fn cleanup_untracked(&self, dry_run: bool) -> Result<Vec<PathBuf>> {
        let tracked: HashSet<&str> = self
            .data
            .pages
            .values()
            .map(|entry| entry.export_path.as_str())
            .collect();

        let mut markdown = Vec::new();
        collect_markdown_files(&self.root, &mut markdown)?;

        let mut removed = Vec::new();
        for path in markdown {
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if tracked.contains(rel_str.as_str()) {
                continue;
            }
            debug!(path = %rel.display(), dry_run, "Removing untracked file");
            if !dry_run {
                fs::remove_file(&path)?;
            }
            removed.push(rel.to_path_buf());
        }
        Ok(removed)
    }

    fn save(&mut self) -> Result<()> {
        // Another export into the same directory may have added entries
        // since we loaded. Keep theirs where we have no newer record.
        if let Ok(raw) = fs::read_to_string(&self.path) {
            if let Ok(disk) = serde_json::from_str::<LockData>(&raw) {
                for (id, entry) in disk.pages {
                    self.data.pages.entry(id).or_insert(entry);
                }
            }
        }
        self.data.last_export = Some(Utc::now());
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

fn collect_markdown_files(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_markdown_files(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            found.push(path);
        }
    }
    Ok(())
}
