//! Build result types.
//!
//! Contains types for representing the outcome of pipeline runs.

use crate::build::PipelineKind;
use std::path::PathBuf;
use std::time::Duration;

/// Status of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Pipeline ran and wrote its outputs
    Success,
    /// Pipeline had no sources to process
    Skipped,
    /// Pipeline (or some of its files) failed
    Failed(String),
}

impl BuildStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed(_))
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "skipped"),
            BuildStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// A failure attributed to one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    /// Path to the file that failed
    pub file: PathBuf,
    /// Error message
    pub message: String,
}

impl FileError {
    /// Create a new file error
    pub fn new(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self { file: file.into(), message: message.into() }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// What a pipeline produced before it is turned into a [`PipelineResult`].
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Files written
    pub outputs: Vec<PathBuf>,
    /// Files that failed (the rest of the run continued)
    pub errors: Vec<FileError>,
    /// Non-fatal messages
    pub warnings: Vec<String>,
}

/// Result of running a single pipeline.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Pipeline that ran
    pub kind: PipelineKind,
    /// Run status
    pub status: BuildStatus,
    /// Output files produced
    pub outputs: Vec<PathBuf>,
    /// Per-file errors
    pub errors: Vec<FileError>,
    /// Warning messages (if any)
    pub warnings: Vec<String>,
    /// Run duration
    pub duration: Duration,
}

impl PipelineResult {
    /// Build a result from what the pipeline produced.
    ///
    /// Any file error fails the run; a run that wrote nothing is skipped.
    pub fn from_output(kind: PipelineKind, output: PipelineOutput, duration: Duration) -> Self {
        let status = if !output.errors.is_empty() {
            let failed = output.errors.len();
            BuildStatus::Failed(format!(
                "{} file{} failed",
                failed,
                if failed == 1 { "" } else { "s" }
            ))
        } else if output.outputs.is_empty() {
            BuildStatus::Skipped
        } else {
            BuildStatus::Success
        };

        Self {
            kind,
            status,
            outputs: output.outputs,
            errors: output.errors,
            warnings: output.warnings,
            duration,
        }
    }

    /// Create a result for a run that failed as a whole.
    pub fn failed(kind: PipelineKind, error: String, duration: Duration) -> Self {
        Self {
            kind,
            status: BuildStatus::Failed(error),
            outputs: vec![],
            errors: vec![],
            warnings: vec![],
            duration,
        }
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each pipeline
    pub pipelines: Vec<PipelineResult>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pipeline result.
    pub fn add_result(&mut self, result: PipelineResult) {
        self.pipelines.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Get the result of one pipeline.
    pub fn get(&self, kind: PipelineKind) -> Option<&PipelineResult> {
        self.pipelines.iter().find(|r| r.kind == kind)
    }

    /// Get the number of successful pipelines.
    pub fn success_count(&self) -> usize {
        self.pipelines.iter().filter(|r| matches!(r.status, BuildStatus::Success)).count()
    }

    /// Get the number of skipped pipelines.
    pub fn skipped_count(&self) -> usize {
        self.pipelines.iter().filter(|r| matches!(r.status, BuildStatus::Skipped)).count()
    }

    /// Get the number of failed pipelines.
    pub fn failed_count(&self) -> usize {
        self.pipelines.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the overall build succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get all outputs produced.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.pipelines.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// Get all warnings.
    pub fn all_warnings(&self) -> Vec<&String> {
        self.pipelines.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    /// Get failed pipeline results.
    pub fn failures(&self) -> Vec<&PipelineResult> {
        self.pipelines.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let files = self.all_outputs().len();

        if failed > 0 {
            lines.push(format!(
                "Build failed: {} succeeded, {} skipped, {} failed ({} files written)",
                success, skipped, failed, files
            ));
            for pipeline in self.failures() {
                lines.push(format!("  - {}: {}", pipeline.kind, pipeline.status));
                for error in &pipeline.errors {
                    lines.push(format!("      {}", error));
                }
            }
        } else {
            lines.push(format!(
                "Build succeeded: {} pipelines, {} skipped, {} files written in {}",
                success,
                skipped,
                files,
                format_duration(self.total_duration)
            ));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}): ", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(outputs: &[&str], errors: &[&str]) -> PipelineOutput {
        PipelineOutput {
            outputs: outputs.iter().map(PathBuf::from).collect(),
            errors: errors.iter().map(|f| FileError::new(*f, "broken")).collect(),
            warnings: vec![],
        }
    }

    #[test]
    fn test_build_status_display() {
        assert_eq!(BuildStatus::Success.to_string(), "success");
        assert_eq!(BuildStatus::Skipped.to_string(), "skipped");
        assert_eq!(BuildStatus::Failed("error".to_string()).to_string(), "failed: error");
    }

    #[test]
    fn test_build_status_is_success() {
        assert!(BuildStatus::Success.is_success());
        assert!(BuildStatus::Skipped.is_success());
        assert!(!BuildStatus::Failed("error".to_string()).is_success());
    }

    #[test]
    fn test_from_output_success() {
        let result = PipelineResult::from_output(
            PipelineKind::Scripts,
            output(&["dist/js/production.js"], &[]),
            Duration::from_millis(5),
        );
        assert_eq!(result.status, BuildStatus::Success);
        assert_eq!(result.outputs.len(), 1);
    }

    #[test]
    fn test_from_output_nothing_written_is_skipped() {
        let result =
            PipelineResult::from_output(PipelineKind::Images, output(&[], &[]), Duration::ZERO);
        assert_eq!(result.status, BuildStatus::Skipped);
        assert!(result.is_success());
    }

    #[test]
    fn test_from_output_partial_failure_keeps_outputs() {
        let result = PipelineResult::from_output(
            PipelineKind::Images,
            output(&["dist/img/a.png"], &["src/img/broken.png"]),
            Duration::ZERO,
        );
        assert_eq!(result.status, BuildStatus::Failed("1 file failed".to_string()));
        assert_eq!(result.outputs.len(), 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_build_result_counts() {
        let mut result = BuildResult::new();
        result.add_result(PipelineResult::from_output(
            PipelineKind::Html,
            output(&["dist/index.html"], &[]),
            Duration::ZERO,
        ));
        result.add_result(PipelineResult::from_output(
            PipelineKind::Images,
            output(&[], &[]),
            Duration::ZERO,
        ));
        result.add_result(PipelineResult::failed(
            PipelineKind::Styles,
            "sass error".to_string(),
            Duration::ZERO,
        ));

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert!(result.get(PipelineKind::Styles).unwrap().status.is_failure());
        assert!(result.get(PipelineKind::Scripts).is_none());
    }

    #[test]
    fn test_build_result_summary() {
        let mut result = BuildResult::new();
        result.add_result(PipelineResult::from_output(
            PipelineKind::Scripts,
            output(&["dist/js/production.js"], &[]),
            Duration::from_millis(10),
        ));

        let summary = result.with_duration(Duration::from_millis(100)).summary();
        assert!(summary.contains("Build succeeded"));
        assert!(summary.contains("1 files written"));
        assert!(summary.contains("100ms"));
    }

    #[test]
    fn test_build_result_failure_summary_lists_files() {
        let mut result = BuildResult::new();
        result.add_result(PipelineResult::from_output(
            PipelineKind::Images,
            output(&[], &["src/img/empty.png"]),
            Duration::ZERO,
        ));

        let summary = result.summary();
        assert!(summary.contains("Build failed"));
        assert!(summary.contains("images: failed: 1 file failed"));
        assert!(summary.contains("src/img/empty.png: broken"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
