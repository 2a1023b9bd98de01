//! confluence-markdown-exporter CLI entry point.

use clap::Parser;
use cme::cli::commands;
use cme::cli::{Cli, Commands};
use cme::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Run the command and handle errors
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let output = cli.output.as_deref();
    match &cli.command {
        Commands::Pages { page_ids, opts } => commands::export::pages(page_ids, opts, output),
        Commands::PagesWithDescendants { page_ids, opts } => {
            commands::export::pages_with_descendants(page_ids, opts, output)
        }
        Commands::Spaces { space_keys, opts } => {
            commands::export::spaces(space_keys, opts, output)
        }
        Commands::AllSpaces { opts } => commands::export::all_spaces(opts, output),

        Commands::Sync { force, dry_run } => commands::sync::execute(*force, *dry_run, output),

        Commands::Status => commands::status::execute(output),
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
