//! Version command implementation.

use crate::error::Result;

/// Execute the version command.
pub fn execute() -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };

    println!("cme version {version} ({build})");
    Ok(())
}
