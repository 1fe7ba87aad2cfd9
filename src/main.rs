//! sitepipe - Command-line tool for building and serving static sites

use std::process::ExitCode;

use sitepipe::cli;

fn main() -> ExitCode {
    cli::run()
}
