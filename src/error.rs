//! Errors that abort a run before any target is dispatched.

use std::path::PathBuf;

/// Fatal preconditions. Anything that only affects a single target is a
/// [`crate::build::BuildOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The `go` command is missing or does not run.
    #[error("go toolchain not found: {0}")]
    ToolchainNotFound(String),

    /// The source file or package passed with `-s` does not exist.
    #[error("source not found: {}", path.display())]
    SourceNotFound {
        /// Path as given on the command line.
        path: PathBuf,
    },

    /// The platform specification resolved to nothing.
    #[error("no valid target platforms in '{spec}'")]
    NoTargets {
        /// The specification string that was resolved.
        spec: String,
    },

    /// The output tree could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `--clean` failed to remove the previous output tree.
    #[error("failed to clean output directory {}: {source}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be started.
    #[error("failed to start build workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A configuration file exists but could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but is not valid TOML.
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Result type for fatal preconditions.
pub type Result<T> = std::result::Result<T, BuildError>;
