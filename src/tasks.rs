//! Composite tasks.
//!
//! `build` runs the content pipelines in parallel. `watch` runs `build` to
//! completion, then the dev server and the watcher side by side.

use crate::build::{BuildContext, BuildResult, ParallelBuild};
use crate::serve::{DevServer, Reloader, ServeError};
use crate::watch::{watch_and_dispatch, WatchError};
use thiserror::Error;

/// Error that ends a composite task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The async runtime could not be started
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),
    /// The dev server failed to start
    #[error(transparent)]
    Serve(#[from] ServeError),
    /// The watcher failed
    #[error(transparent)]
    Watch(#[from] WatchError),
    /// A task ended abnormally
    #[error("Task failed: {0}")]
    Join(String),
}

/// Run every content pipeline once.
pub fn build(ctx: &BuildContext) -> BuildResult {
    tracing::info!("building {}", ctx.config().project.name);
    ParallelBuild::new(ctx.clone()).run()
}

/// Build, then serve `dist` and watch `src` until interrupted.
///
/// Pipeline failures are logged and never end the task; only server or
/// watcher setup failures do.
pub fn watch(ctx: &BuildContext) -> Result<(), TaskError> {
    let initial = build(ctx);
    println!("{}", initial.summary());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(TaskError::Runtime)?;

    runtime.block_on(serve_and_watch(ctx.clone(), initial))
}

async fn serve_and_watch(ctx: BuildContext, initial: BuildResult) -> Result<(), TaskError> {
    let reloader = Reloader::new();
    let server = &ctx.config().server;
    let (addr, serving) =
        DevServer::new(ctx.dist_root(), &server.host, server.port, reloader.clone())?.bind()?;
    tracing::info!("serving {} at http://{}", ctx.dist_root().display(), addr);

    let watcher = tokio::task::spawn_blocking(move || watch_and_dispatch(&ctx, reloader, &initial));

    tokio::select! {
        () = serving => Err(TaskError::Join("dev server stopped".to_string())),
        joined = watcher => match joined {
            Ok(result) => result.map_err(TaskError::from),
            Err(e) => Err(TaskError::Join(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::PipelineKind;
    use crate::config::SiteConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_runs_all_pipelines() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/html/index.html", "<p>x</p>");
        write(temp.path(), "src/js/app.js", "var x;");

        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());
        let result = build(&ctx);

        assert_eq!(result.pipelines.len(), PipelineKind::ALL.len());
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.skipped_count(), 2);
    }

    #[test]
    fn test_watch_fails_without_sources() {
        let temp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.server.port = 0;

        let ctx = BuildContext::new(config, temp.path().to_path_buf());
        let err = watch(&ctx).unwrap_err();
        assert!(matches!(err, TaskError::Watch(WatchError::SourceNotFound(_))));
    }
}
