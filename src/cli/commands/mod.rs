//! Command implementations.

use std::path::{Path, PathBuf};

pub mod completions;
pub mod export;
pub mod status;
pub mod sync;
pub mod version;

/// Output directory from `--output`/`CME_OUTPUT`, defaulting to the
/// current directory.
fn resolve_output_dir(output: Option<&Path>) -> PathBuf {
    output.map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
