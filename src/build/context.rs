//! Build context containing configuration and paths for a build.

use crate::build::PipelineKind;
use crate::config::SiteConfig;
use std::path::{Path, PathBuf};

/// Directory holding all pipeline sources, relative to the project root.
pub const SRC_DIR: &str = "src";

/// Directory receiving all pipeline outputs, relative to the project root.
pub const DIST_DIR: &str = "dist";

/// Build context containing configuration and paths for a build operation.
///
/// The directory layout is fixed: sources live under `src/<kind>` and
/// outputs under `dist`, both relative to the project root.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: SiteConfig,
    /// Project root directory (where sitepipe.toml is located)
    project_root: PathBuf,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self { config, project_root }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Root of the source tree.
    pub fn src_root(&self) -> PathBuf {
        self.project_root.join(SRC_DIR)
    }

    /// Root of the output tree, served by the dev server.
    pub fn dist_root(&self) -> PathBuf {
        self.project_root.join(DIST_DIR)
    }

    /// Source directory of a pipeline (e.g. `src/scss`).
    pub fn src_dir(&self, kind: PipelineKind) -> PathBuf {
        self.src_root().join(kind.src_subdir())
    }

    /// Output directory of a pipeline (e.g. `dist/css`).
    pub fn out_dir(&self, kind: PipelineKind) -> PathBuf {
        match kind.out_subdir() {
            Some(sub) => self.dist_root().join(sub),
            None => self.dist_root(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BuildContext {
        BuildContext::new(SiteConfig::default(), PathBuf::from("/project"))
    }

    #[test]
    fn test_context_roots() {
        let ctx = context();
        assert_eq!(ctx.project_root(), Path::new("/project"));
        assert_eq!(ctx.src_root(), PathBuf::from("/project/src"));
        assert_eq!(ctx.dist_root(), PathBuf::from("/project/dist"));
    }

    #[test]
    fn test_context_pipeline_dirs() {
        let ctx = context();
        assert_eq!(ctx.src_dir(PipelineKind::Html), PathBuf::from("/project/src/html"));
        assert_eq!(ctx.src_dir(PipelineKind::Styles), PathBuf::from("/project/src/scss"));
        assert_eq!(ctx.src_dir(PipelineKind::Scripts), PathBuf::from("/project/src/js"));
        assert_eq!(ctx.src_dir(PipelineKind::Images), PathBuf::from("/project/src/img"));

        assert_eq!(ctx.out_dir(PipelineKind::Html), PathBuf::from("/project/dist"));
        assert_eq!(ctx.out_dir(PipelineKind::Styles), PathBuf::from("/project/dist/css"));
        assert_eq!(ctx.out_dir(PipelineKind::Scripts), PathBuf::from("/project/dist/js"));
        assert_eq!(ctx.out_dir(PipelineKind::Images), PathBuf::from("/project/dist/img"));
    }
}
