//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
pub mod progress;

/// Export Confluence spaces and pages to Markdown, and keep them in sync.
#[derive(Parser, Debug)]
#[command(name = "cme", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output directory for Markdown files and the state file
    /// (default: current directory)
    #[arg(short, long, global = true, env = "CME_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export single pages by id
    Pages {
        /// Page ids to export
        #[arg(required = true)]
        page_ids: Vec<u64>,

        #[command(flatten)]
        opts: ExportOpts,
    },

    /// Export pages and every page below them
    PagesWithDescendants {
        /// Root page ids to export
        #[arg(required = true)]
        page_ids: Vec<u64>,

        #[command(flatten)]
        opts: ExportOpts,
    },

    /// Export every page in the named spaces
    Spaces {
        /// Space keys to export
        #[arg(required = true)]
        space_keys: Vec<String>,

        #[command(flatten)]
        opts: ExportOpts,
    },

    /// Export every page in every space of the organization
    AllSpaces {
        #[command(flatten)]
        opts: ExportOpts,
    },

    /// Re-export what changed remotely since the last export
    Sync {
        /// Re-export every page regardless of version, and permit a
        /// changed Confluence URL
        #[arg(long)]
        force: bool,

        /// Report what would change without writing or deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Summarize the export state without contacting Confluence
    Status,

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by all export commands.
#[derive(Args, Debug, Default)]
pub struct ExportOpts {
    /// Add this scope to an existing state file instead of failing
    #[arg(long)]
    pub append: bool,

    /// Track exports in a lockfile and skip pages already on disk at the
    /// same version
    #[arg(long)]
    pub use_lockfile: bool,

    /// Delete Markdown files the lockfile does not track
    #[arg(long, requires = "use_lockfile")]
    pub clean: bool,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
