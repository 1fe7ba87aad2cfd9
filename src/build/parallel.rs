//! Parallel build execution.
//!
//! The content pipelines share no state, so a build runs each of them on
//! its own scoped thread and joins them all. Results come back in
//! [`PipelineKind::ALL`] order regardless of which pipeline finishes first.
//!
//! # Example
//!
//! ```ignore
//! use sitepipe::build::{BuildContext, ParallelBuild};
//!
//! let context = BuildContext::new(config, project_root);
//! let result = ParallelBuild::new(context).run();
//!
//! println!("{}", result.summary());
//! ```

use crate::build::{run_pipeline, BuildContext, BuildResult, PipelineKind, PipelineResult};
use std::time::{Duration, Instant};

/// Parallel build executor.
pub struct ParallelBuild {
    /// Build context
    context: BuildContext,
}

impl ParallelBuild {
    /// Create a build of every content pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context }
    }

    /// Run the build.
    pub fn run(&self) -> BuildResult {
        let start = Instant::now();

        let mut result = BuildResult::new();
        for pipeline in self.run_scoped() {
            result.add_result(pipeline);
        }
        result.with_duration(start.elapsed())
    }

    fn run_scoped(&self) -> Vec<PipelineResult> {
        let context = &self.context;

        std::thread::scope(|s| {
            let handles: Vec<_> = PipelineKind::ALL
                .iter()
                .map(|&kind| (kind, s.spawn(move || run_pipeline(context, kind))))
                .collect();

            handles
                .into_iter()
                .map(|(kind, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!("{} pipeline panicked", kind);
                        let message = "pipeline panicked".to_string();
                        PipelineResult::failed(kind, message, Duration::ZERO)
                    })
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildStatus;
    use crate::config::SiteConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/html/index.html", "<p>home</p>");
        write(temp.path(), "src/scss/main.scss", "a { color: red; }");
        write(temp.path(), "src/js/app.js", "var x = 1;");
        write(temp.path(), "src/img/logo.svg", "<svg><g/></svg>");
        temp
    }

    #[test]
    fn test_parallel_build_reports_in_fixed_order() {
        let temp = fixture();
        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());

        let result = ParallelBuild::new(ctx).run();
        let kinds: Vec<_> = result.pipelines.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, PipelineKind::ALL.to_vec());
        assert!(result.is_success(), "{}", result.summary());
        assert_eq!(result.success_count(), 4);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let temp = fixture();
        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());

        let mut sequential = BuildResult::new();
        for kind in PipelineKind::ALL {
            sequential.add_result(run_pipeline(&ctx, kind));
        }
        let parallel = ParallelBuild::new(ctx).run();

        let outputs = |r: &BuildResult| r.all_outputs().into_iter().cloned().collect::<Vec<_>>();
        assert_eq!(outputs(&parallel), outputs(&sequential));
    }

    #[test]
    fn test_failure_does_not_stop_other_pipelines() {
        let temp = fixture();
        write(temp.path(), "src/scss/main.scss", "a { color: ");
        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());

        let result = ParallelBuild::new(ctx).run();
        assert_eq!(result.failed_count(), 1);
        assert!(result.get(PipelineKind::Styles).unwrap().status.is_failure());
        assert_eq!(result.get(PipelineKind::Scripts).unwrap().status, BuildStatus::Success);
        assert!(temp.path().join("dist/index.html").exists());
    }
}
