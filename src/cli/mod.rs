//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// sitepipe - Build HTML, Sass, JavaScript and images into dist/, with a live-reloading dev server
#[derive(Parser)]
#[command(name = "sitepipe")]
#[command(about = "Build src/ into dist/ and serve it with live reload")]
#[command(version)]
pub struct Cli {
    /// Path to sitepipe.toml (default: nearest one above the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every pipeline once
    Build,

    /// Build, then serve dist/ and rebuild on changes (the default)
    Watch {
        /// Dev server port (overrides sitepipe.toml)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `info`, or `debug` when verbose.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also arrive here
            return if e.use_stderr() {
                ExitCode::from(EXIT_INVALID_ARGS)
            } else {
                ExitCode::from(EXIT_SUCCESS)
            };
        }
    };
    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::Watch { port: None }) {
        Commands::Build => build::run_build(cli.config.as_deref()),
        Commands::Watch { port } => build::run_watch(cli.config.as_deref(), port),
    }
}
