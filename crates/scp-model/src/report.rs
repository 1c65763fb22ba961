use std::path::{Path, PathBuf};

use serde::Serialize;

/// Severity of a recorded finding. `Error` marks the file as failed;
/// `Info` is user feedback only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Info,
}

/// One finding discovered while checking a file.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// 1-based line number in the source file, when the finding is row-scoped.
    pub line: Option<u64>,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            line: None,
            message: message.into(),
        }
    }

    pub fn error_at(line: u64, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Info,
            line: None,
            message: message.into(),
        }
    }
}

/// Accumulated findings for a single file. Checks append and keep going;
/// nothing here aborts a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            issues: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }
}
