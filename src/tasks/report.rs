// src/tasks/report.rs

//! Per-run task results.

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::engine::TaskOutcome;
use crate::tasks::{BuildMode, FailureRule, TaskId};

/// A transformation error for one input file.
///
/// `line`/`column` are 1-based and only present when the underlying tool
/// reports a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub file: PathBuf,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
}

impl FileError {
    pub fn new(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_location(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: Some(column),
            message: message.into(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(col) = self.column {
                write!(f, ":{col}")?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// One lint finding inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub line: usize,
    pub column: usize,
    pub rule: &'static str,
    pub reason: String,
}

/// All findings for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintReport {
    /// Path relative to the task's source base.
    pub file: String,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    /// `<file> (<n> errors)` followed by one `(<line>:<col>) <reason>` line
    /// per finding.
    pub fn format(&self) -> String {
        let mut out = format!("{} ({} errors)", self.file, self.findings.len());
        for f in &self.findings {
            out.push_str(&format!("\n({}:{}) {}", f.line, f.column, f.reason));
        }
        out
    }
}

/// Result of one task run.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: TaskId,
    pub mode: BuildMode,
    /// Number of input files the task looked at.
    pub processed: usize,
    /// Root-relative paths whose content changed in this run.
    pub written: Vec<PathBuf>,
    pub errors: Vec<FileError>,
    pub lint: Vec<LintReport>,
    pub outcome: TaskOutcome,
}

impl TaskReport {
    pub fn new(task: TaskId, mode: BuildMode) -> Self {
        Self {
            task,
            mode,
            processed: 0,
            written: Vec::new(),
            errors: Vec::new(),
            lint: Vec::new(),
            outcome: TaskOutcome::Success,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.lint.iter().map(|r| r.findings.len()).sum()
    }

    /// Derive the outcome from the collected problems.
    pub fn decide_outcome(&self, rule: FailureRule) -> TaskOutcome {
        let problems = match rule {
            FailureRule::TransformErrors => match self.mode {
                BuildMode::Interactive => 0,
                BuildMode::Strict => self.errors.len(),
            },
            FailureRule::NeverFail => 0,
            FailureRule::FailOnFindings => self.finding_count() + self.errors.len(),
        };
        if problems == 0 {
            TaskOutcome::Success
        } else {
            TaskOutcome::Failed(problems)
        }
    }

    /// Surface the report through the logging channel.
    pub fn log(&self) {
        for err in &self.errors {
            error!(
                task = %self.task,
                file = %err.file.display(),
                line = err.line,
                column = err.column,
                "{}",
                err.message
            );
        }
        for lint in &self.lint {
            warn!(task = %self.task, "{}", lint.format());
        }

        match self.outcome {
            TaskOutcome::Success => info!(
                task = %self.task,
                processed = self.processed,
                written = self.written.len(),
                errors = self.errors.len(),
                findings = self.finding_count(),
                "task finished"
            ),
            TaskOutcome::Failed(problems) => error!(
                task = %self.task,
                processed = self.processed,
                problems,
                "task failed"
            ),
        }
    }
}

/// 1-based (line, column) of a byte offset, counting columns in chars.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
