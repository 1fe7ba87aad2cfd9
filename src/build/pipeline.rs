//! Single pipeline execution.
//!
//! Wraps a content pipeline run with timing and logging and turns its
//! outcome into a [`PipelineResult`]. Failures never propagate past this
//! point: a failed run is reported, not raised.

use crate::build::{BuildContext, BuildStatus, PipelineKind, PipelineResult};
use crate::pipelines;
use std::time::Instant;

/// Run one content pipeline and report its outcome.
pub fn run_pipeline(ctx: &BuildContext, kind: PipelineKind) -> PipelineResult {
    let start = Instant::now();
    let span = tracing::info_span!("pipeline", kind = %kind);
    let _enter = span.enter();

    tracing::debug!("starting");
    let result = match pipelines::run(ctx, kind) {
        Ok(output) => PipelineResult::from_output(kind, output, start.elapsed()),
        Err(e) => PipelineResult::failed(kind, e.to_string(), start.elapsed()),
    };

    log_result(&result);
    result
}

fn log_result(result: &PipelineResult) {
    for warning in &result.warnings {
        tracing::warn!("{}", warning);
    }
    for error in &result.errors {
        tracing::error!("{}", error);
    }

    match &result.status {
        BuildStatus::Success => tracing::info!(
            "finished in {} ({} file{})",
            crate::build::format_duration(result.duration),
            result.outputs.len(),
            if result.outputs.len() == 1 { "" } else { "s" }
        ),
        BuildStatus::Skipped => tracing::info!("skipped, nothing to build"),
        BuildStatus::Failed(message) => tracing::error!("failed: {}", message),
    }
}
