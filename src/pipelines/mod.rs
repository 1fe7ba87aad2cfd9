//! Content pipelines
//!
//! Each pipeline reads the sources of one [`PipelineKind`], applies a fixed
//! chain of transformations and writes the results below `dist`:
//!
//! | Pipeline | Chain | Output |
//! |----------|-------|--------|
//! | [`html`] | include resolution, markup minification | `dist/*.html` |
//! | [`styles`] | Sass, vendor prefixes, CSS minification, size report | `dist/css/production.css` |
//! | [`scripts`] | concatenation, minification | `dist/js/production.js` |
//! | [`images`] | per-format optimization | `dist/img/**` |
//!
//! Outputs are written only once a file is fully transformed, so a failing
//! run never clobbers the previous output.

pub mod html;
pub mod images;
pub mod include;
pub mod scripts;
pub mod styles;

use crate::build::{BuildContext, DiscoveryError, PipelineKind, PipelineOutput};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub use include::{IncludeError, IncludeResolver};

/// Error raised by a pipeline step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Source discovery failed
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Reading a source or writing an output failed
    #[error("IO error on '{}': {1}", .0.display())]
    Io(PathBuf, std::io::Error),
    /// Include resolution failed
    #[error(transparent)]
    Include(#[from] IncludeError),
    /// Sass compilation failed
    #[error("Sass compilation failed: {0}")]
    Sass(String),
    /// CSS parsing, prefixing or minification failed
    #[error("CSS processing failed: {0}")]
    Css(String),
    /// JavaScript parsing or minification failed
    #[error("Script minification failed: {0}")]
    Script(String),
    /// Image decoding or encoding failed
    #[error("Image optimization failed: {0}")]
    Image(String),
}

/// Run the transformations of one pipeline.
pub fn run(ctx: &BuildContext, kind: PipelineKind) -> Result<PipelineOutput, PipelineError> {
    match kind {
        PipelineKind::Html => html::run(ctx),
        PipelineKind::Styles => styles::run(ctx),
        PipelineKind::Scripts => scripts::run(ctx),
        PipelineKind::Images => images::run(ctx),
    }
}

/// Write an output file, creating parent directories as needed.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::Io(parent.to_path_buf(), e))?;
    }
    fs::write(path, contents).map_err(|e| PipelineError::Io(path.to_path_buf(), e))
}

/// Read a source file as text.
pub fn read_source(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|e| PipelineError::Io(path.to_path_buf(), e))
}

/// Format a byte count the way size reports show it (`512 B`, `1.43 kB`).
pub fn format_size(bytes: usize) -> String {
    if bytes < 1000 {
        format!("{} B", bytes)
    } else if bytes < 1_000_000 {
        format!("{:.2} kB", bytes as f64 / 1000.0)
    } else {
        format!("{:.2} MB", bytes as f64 / 1_000_000.0)
    }
}

/// Compile a fixed pattern once.
pub(crate) fn static_regex(
    cell: &'static OnceLock<regex::Regex>,
    pattern: &str,
) -> &'static regex::Regex {
    cell.get_or_init(|| regex::Regex::new(pattern).expect("static pattern is valid"))
}
