//! Watch mode: re-run pipelines when their sources change
//!
//! Changes under `src/` are debounced, matched against a static table of
//! glob patterns, and each matched pipeline runs once per batch. After a
//! batch the dev server is told to reload its clients.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

use crate::build::{run_pipeline, BuildContext, BuildResult, PipelineKind, PipelineResult};
use crate::serve::Reloader;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Invalid dispatch pattern
    #[error("Invalid watch pattern '{0}': {1}")]
    Pattern(String, glob::PatternError),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    /// Source directory not found
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// Files and pipelines that recovered since the previous run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Files that failed before and not anymore
    pub fixed_files: Vec<PathBuf>,
    /// The pipeline failed as a whole before and succeeded now
    pub pipeline_fixed: bool,
}

/// Tracks failures across pipeline runs for recovery detection
#[derive(Debug, Default)]
pub struct ErrorTracker {
    /// Files that had errors in the previous run of each pipeline
    files_with_errors: HashMap<PipelineKind, HashSet<PathBuf>>,
    /// Pipelines whose previous run failed
    failed_pipelines: HashSet<PipelineKind>,
}

impl ErrorTracker {
    /// Create a new error tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every pipeline of a full build.
    pub fn seed(&mut self, result: &BuildResult) {
        for pipeline in &result.pipelines {
            self.update(pipeline);
        }
    }

    /// Update tracker with a new pipeline result, returns what recovered
    pub fn update(&mut self, result: &PipelineResult) -> Recovery {
        let current: HashSet<PathBuf> = result.errors.iter().map(|e| e.file.clone()).collect();
        let previous = self.files_with_errors.remove(&result.kind).unwrap_or_default();

        let mut fixed_files: Vec<PathBuf> = previous.difference(&current).cloned().collect();
        fixed_files.sort();

        let was_failed = self.failed_pipelines.remove(&result.kind);
        if result.status.is_failure() {
            self.failed_pipelines.insert(result.kind);
        }
        if !current.is_empty() {
            self.files_with_errors.insert(result.kind, current);
        }

        Recovery { fixed_files, pipeline_fixed: was_failed && !result.status.is_failure() }
    }

    /// Check if there are any tracked errors
    pub fn has_errors(&self) -> bool {
        !self.failed_pipelines.is_empty()
    }

    /// Get the number of files with errors
    pub fn error_count(&self) -> usize {
        self.files_with_errors.values().map(HashSet::len).sum()
    }
}

/// Static mapping from changed source paths to the pipelines they feed.
#[derive(Debug, Clone)]
pub struct WatchDispatch {
    roots: Vec<PathBuf>,
    table: Vec<(glob::Pattern, PipelineKind)>,
}

impl WatchDispatch {
    /// Build the dispatch table for a project root.
    pub fn new(project_root: &Path) -> Result<Self, WatchError> {
        let mut table = Vec::new();
        for kind in PipelineKind::ALL {
            for pattern in kind.watch_patterns() {
                let compiled = glob::Pattern::new(&pattern)
                    .map_err(|e| WatchError::Pattern(pattern.clone(), e))?;
                table.push((compiled, kind));
            }
        }

        let mut roots = vec![project_root.to_path_buf()];
        if let Ok(canonical) = project_root.canonicalize() {
            if canonical != project_root {
                roots.push(canonical);
            }
        }

        Ok(Self { roots, table })
    }

    /// Pipeline fed by `path`, if any.
    pub fn kind_for(&self, path: &Path) -> Option<PipelineKind> {
        let relative = self.roots.iter().find_map(|root| path.strip_prefix(root).ok())?;
        self.table
            .iter()
            .find(|(pattern, _)| pattern.matches_path(relative))
            .map(|(_, kind)| *kind)
    }

    /// Distinct pipelines fed by a batch of paths, in reporting order.
    pub fn kinds_for<'a, I>(&self, paths: I) -> Vec<PipelineKind>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let kinds: BTreeSet<PipelineKind> =
            paths.into_iter().filter_map(|p| self.kind_for(p)).collect();
        kinds.into_iter().collect()
    }
}

/// State carried between debounced batches.
pub struct WatchSession {
    dispatch: WatchDispatch,
    tracker: ErrorTracker,
    reloader: Reloader,
}

impl WatchSession {
    /// Create a session for a project root.
    pub fn new(project_root: &Path, reloader: Reloader) -> Result<Self, WatchError> {
        let dispatch = WatchDispatch::new(project_root)?;
        Ok(Self { dispatch, tracker: ErrorTracker::new(), reloader })
    }

    /// Record the build that ran before watching started.
    pub fn seed(&mut self, initial: &BuildResult) {
        self.tracker.seed(initial);
    }

    /// Run every pipeline fed by `paths` once, then signal a reload.
    ///
    /// Returns the pipelines that ran.
    pub fn handle_batch<F>(&mut self, paths: &[PathBuf], mut runner: F) -> Vec<PipelineKind>
    where
        F: FnMut(PipelineKind) -> PipelineResult,
    {
        let kinds = self.dispatch.kinds_for(paths.iter().map(PathBuf::as_path));
        if kinds.is_empty() {
            return kinds;
        }

        for path in paths {
            if let Some(name) = path.file_name() {
                tracing::info!("changed: {}", name.to_string_lossy());
            }
        }

        for &kind in &kinds {
            let result = runner(kind);
            let recovery = self.tracker.update(&result);
            for fixed in &recovery.fixed_files {
                if let Some(name) = fixed.file_name() {
                    tracing::info!("fixed: {}", name.to_string_lossy());
                }
            }
            if recovery.pipeline_fixed {
                tracing::info!("{} pipeline recovered", kind);
            }
        }

        if self.tracker.has_errors() {
            let count = self.tracker.error_count();
            tracing::warn!("{} file{} still failing", count, if count == 1 { "" } else { "s" });
        }

        let clients = self.reloader.reload();
        tracing::debug!("reload sent to {} client(s)", clients);
        kinds
    }
}

/// Watch `src/` and dispatch pipeline runs until the channel closes.
///
/// This function blocks and runs until interrupted (Ctrl+C).
pub fn watch_and_dispatch(
    ctx: &BuildContext,
    reloader: Reloader,
    initial: &BuildResult,
) -> Result<(), WatchError> {
    let src_root = ctx.src_root();
    if !src_root.exists() {
        return Err(WatchError::SourceNotFound(src_root));
    }

    let mut session = WatchSession::new(ctx.project_root(), reloader)?;
    session.seed(initial);

    let (tx, rx) = channel();
    let debounce = Duration::from_millis(u64::from(ctx.config().watch.debounce_ms));
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
    debouncer
        .watcher()
        .watch(&src_root, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    tracing::info!("watching {} for changes", src_root.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let paths: Vec<PathBuf> = events
                    .into_iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .map(|e| e.path)
                    .collect();
                session.handle_batch(&paths, |kind| run_pipeline(ctx, kind));
            }
            Ok(Err(error)) => {
                tracing::warn!("watch error: {:?}, continuing to watch", error);
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}
