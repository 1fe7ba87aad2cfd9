//! Source file discovery for the build system.
//!
//! Each pipeline reads a fixed set of glob patterns below its source
//! directory. Results are sorted so that concatenation order and output
//! trees are stable across runs.

use crate::build::{BuildContext, PipelineKind, IMAGE_EXTENSIONS};
use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, glob::PatternError),
}

/// Discover files below `base_dir` matching a glob pattern.
///
/// Directories are skipped. Unreadable entries are logged and skipped.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = format!("{}/{}", Pattern::escape(&base_dir.to_string_lossy()), pattern);

    let paths =
        glob(&full_pattern).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                tracing::warn!("error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Source patterns of a pipeline, relative to its source directory.
pub fn source_patterns(kind: PipelineKind) -> Vec<String> {
    match kind {
        PipelineKind::Html => vec!["*.html".to_string()],
        PipelineKind::Styles => vec!["main.scss".to_string()],
        PipelineKind::Scripts => vec!["**/*".to_string()],
        PipelineKind::Images => {
            IMAGE_EXTENSIONS.iter().map(|ext| format!("**/*.{}", ext)).collect()
        }
    }
}

/// Discover every source file of a pipeline, deduplicated and sorted.
pub fn discover_sources(
    ctx: &BuildContext,
    kind: PipelineKind,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let src_dir = ctx.src_dir(kind);
    if !src_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut all_files = BTreeSet::new();
    for pattern in source_patterns(kind) {
        all_files.extend(discover_files(&src_dir, &pattern)?);
    }

    Ok(all_files.into_iter().collect())
}
