use std::path::PathBuf;

/// Terminal classification of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success(Artifact),
    /// Deliberately not attempted. Never retried.
    Skipped(String),
    Failed(Failure),
}

impl BuildOutcome {
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed(Failure {
            detail: detail.into(),
            retryable: true,
        })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Final file on disk, `.gz` if compression succeeded.
    pub path: PathBuf,
    pub compressed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub detail: String,
    /// `false` when another attempt cannot change the result.
    pub retryable: bool,
}
