//! Frozen result of a run.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessEntry {
    pub label: String,
    pub artifact: PathBuf,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipEntry {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailEntry {
    pub label: String,
    pub detail: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// At least one artifact, no failures.
    Built,
    /// No failures, but every target was skipped.
    NothingBuilt,
    Failed,
}

/// Entries are in resolved-target order regardless of completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub successful: Vec<SuccessEntry>,
    pub skipped: Vec<SkipEntry>,
    pub failed: Vec<FailEntry>,
}

impl BuildReport {
    /// Skips do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn status(&self) -> ReportStatus {
        if !self.failed.is_empty() {
            ReportStatus::Failed
        } else if self.successful.is_empty() {
            ReportStatus::NothingBuilt
        } else {
            ReportStatus::Built
        }
    }

    pub fn total(&self) -> usize {
        self.successful.len() + self.skipped.len() + self.failed.len()
    }

    pub fn successful_labels(&self) -> Vec<&str> {
        self.successful.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn skipped_labels(&self) -> Vec<&str> {
        self.skipped.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn failed_labels(&self) -> Vec<&str> {
        self.failed.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&serde_json::json!({
            "status": self.status(),
            "successful": self.successful,
            "skipped": self.skipped,
            "failed": self.failed,
        }))
    }
}
