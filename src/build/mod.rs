//! The build engine: per-target policy, the job executor, and the
//! orchestrator that runs jobs in parallel with retries.

mod clean;
mod compress;
pub mod executor;
mod orchestrator;
mod outcome;
pub mod policy;
mod report;

pub use clean::clean_output_dir;
pub use compress::gzip_replace;
pub use executor::{CompileOutput, Compiler, Executor, GoCompiler, Job};
pub use orchestrator::{
    BuildObserver, DEFAULT_RETRY_DELAY, RetryPolicy, RunSettings, Silent, run, run_with_retry,
};
pub use outcome::{Artifact, BuildOutcome, Failure};
pub use policy::{Decision, Invocation, PolicyConfig, TargetPolicy};
pub use report::{BuildReport, FailEntry, ReportStatus, SkipEntry, SuccessEntry};
