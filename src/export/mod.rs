//! Page export pipeline.
//!
//! Fetches pages from Confluence, renders them to Markdown and writes them
//! into the output tree. The file layout mirrors the page hierarchy:
//!
//! ```text
//! <output>/<SPACE KEY>/<ancestor title>/.../<page title>.md
//! ```
//!
//! Every path component is sanitized, so arbitrary page titles cannot write
//! outside the output directory.

pub mod lockfile;
pub mod markdown;
pub mod sanitize;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::confluence::{ConfluenceApi, Page};
use crate::error::Result;
use lockfile::Lockfile;
use markdown::render_document;
use sanitize::sanitize_filename;

/// What happened to a single page during export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The page was fetched and its Markdown file is current on disk.
    Exported { version: i64, output_path: String },
    /// Confluence answered 403 or 404 for the page. Nothing was written.
    Inaccessible,
}

/// Writes pages from one Confluence site into one output directory.
pub struct Exporter<'a, A: ConfluenceApi> {
    api: &'a A,
    output_dir: PathBuf,
    lockfile: Option<Lockfile>,
}

impl<'a, A: ConfluenceApi> Exporter<'a, A> {
    #[must_use]
    pub fn new(api: &'a A, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
            lockfile: None,
        }
    }

    /// Track exports in a lockfile so unchanged pages are skipped on the
    /// next run into the same directory.
    #[must_use]
    pub fn with_lockfile(mut self) -> Self {
        self.lockfile = Some(Lockfile::open(&self.output_dir));
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export a single page.
    ///
    /// Pages the token cannot read (403) and pages that no longer exist
    /// (404) are reported as [`ExportOutcome::Inaccessible`] rather than as
    /// errors, so a batch export can carry on past them.
    ///
    /// # Errors
    ///
    /// Returns an error for API failures other than 403/404 and for any
    /// filesystem failure while writing the Markdown file.
    pub async fn export_page(&mut self, page_id: &str) -> Result<ExportOutcome> {
        let page = match self.api.page(page_id).await {
            Ok(page) => page,
            Err(err) if err.is_access_denied() => {
                info!(page_id, "Page is inaccessible, skipping");
                return Ok(ExportOutcome::Inaccessible);
            }
            Err(err) => return Err(err),
        };

        let rel = page_relative_path(&page);
        let rel_str = path_to_slash_string(&rel);

        if let Some(lock) = &self.lockfile {
            if !lock.should_export(&page.id, page.version, &rel_str) {
                debug!(page_id, path = %rel_str, "Up to date, skipping write");
                return Ok(ExportOutcome::Exported {
                    version: page.version,
                    output_path: rel_str,
                });
            }
        }

        let document = render_document(&page);
        write_file(&self.output_dir.join(&rel), &document)?;
        debug!(page_id, path = %rel_str, version = page.version, "Wrote page");

        if let Some(lock) = &mut self.lockfile {
            lock.record_page(&page.id, &page.title, page.version, &rel_str)?;
        }

        Ok(ExportOutcome::Exported {
            version: page.version,
            output_path: rel_str,
        })
    }

    /// Remove Markdown files the lockfile does not track. A no-op when the
    /// exporter runs without a lockfile.
    pub fn cleanup_untracked(&self, dry_run: bool) -> Result<Vec<PathBuf>> {
        match &self.lockfile {
            Some(lock) => lock.cleanup_untracked(dry_run),
            None => Ok(Vec::new()),
        }
    }
}

/// Path of a page's Markdown file relative to the output directory.
#[must_use]
pub fn page_relative_path(page: &Page) -> PathBuf {
    let mut path = PathBuf::from(sanitize_filename(&page.space_key));
    for ancestor in &page.ancestors {
        path.push(sanitize_filename(&ancestor.title));
    }
    path.push(format!("{}.md", sanitize_filename(&page.title)));
    path
}

fn path_to_slash_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
