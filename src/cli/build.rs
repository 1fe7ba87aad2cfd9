//! Build and watch command implementations

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::BuildContext;
use crate::config::loader::{load_config, merge_cli_overrides, CliOverrides};

/// Load the configuration and turn it into a build context.
fn load_context(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<BuildContext, ExitCode> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let loaded = match load_config(config_path, &cwd) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    match &loaded.source {
        Some(path) => tracing::debug!("using config {}", path.display()),
        None => tracing::debug!("no sitepipe.toml found, using defaults"),
    }

    let mut config = loaded.config;
    merge_cli_overrides(&mut config, overrides);
    Ok(BuildContext::new(config, loaded.root))
}

/// Run the build command
pub fn run_build(config_path: Option<&Path>) -> ExitCode {
    let context = match load_context(config_path, &CliOverrides::default()) {
        Ok(context) => context,
        Err(code) => return code,
    };

    let result = crate::tasks::build(&context);
    println!("{}", result.summary());

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the watch command (build, serve, watch)
pub fn run_watch(config_path: Option<&Path>, port: Option<u16>) -> ExitCode {
    let context = match load_context(config_path, &CliOverrides { port }) {
        Ok(context) => context,
        Err(code) => return code,
    };

    println!("Press Ctrl+C to stop");
    match crate::tasks::watch(&context) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
