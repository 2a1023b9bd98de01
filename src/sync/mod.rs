//! Incremental sync against the Confluence site.
//!
//! A sync runs in three stages:
//!
//! 1. **Replay** re-executes the recorded export scopes against the live
//!    API, collecting current version numbers without downloading content.
//! 2. **Delta** classifies every covered page as new, modified, stale,
//!    deleted or unchanged (see [`crate::state::compute_delta`]).
//! 3. **Execute** exports what needs exporting, removes what vanished, and
//!    saves state after every unit of work.
//!
//! The report renderer sits alongside so `--dry-run` can show exactly what
//! a real run would do.
//!
//! # Example
//!
//! ```ignore
//! use cme::sync::{collect_remote_versions, execute_sync, render_report};
//! use cme::state::compute_delta;
//!
//! let versions = collect_remote_versions(&client, &state, None).await?;
//! let delta = compute_delta(&state, &versions);
//! println!("{}", render_report(&delta, &state));
//! execute_sync(&mut exporter, &mut state, &delta, dry_run, None).await?;
//! ```

mod execute;
mod replay;
mod report;

pub use execute::{execute_sync, export_batch, ProgressFn, SyncStats};
pub use replay::{collect_remote_versions, SENTINEL_VERSION};
pub use report::render_report;
