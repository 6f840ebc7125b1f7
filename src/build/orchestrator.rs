//! Runs every target on a bounded worker pool with per-target retries.

use super::outcome::{BuildOutcome, Failure};
use super::report::{BuildReport, FailEntry, SkipEntry, SuccessEntry};
use crate::error::Result;
use crate::platform::BuildTarget;
use rayon::prelude::*;
use std::sync::Mutex;
use std::time::Duration;

/// Default step of the linear backoff.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(enabled: bool, max_retries: u32) -> Self {
        Self {
            enabled,
            max_retries,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    /// Attempts allowed for one target.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled { self.max_retries.saturating_add(1) } else { 1 }
    }

    /// Delay after the `failed_attempt`-th failure (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay * failed_attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(true, 2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Worker count, at least 1.
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
}

/// Progress hooks. Called from worker threads.
pub trait BuildObserver: Sync {
    fn started(&self, _target: &BuildTarget) {}
    fn attempt_failed(&self, _target: &BuildTarget, _attempt: u32, _failure: &Failure, _delay: Duration) {}
    fn finished(&self, _target: &BuildTarget, _outcome: &BuildOutcome, _attempts: u32) {}
}

/// Observer that ignores everything.
pub struct Silent;

impl BuildObserver for Silent {}

#[derive(Default)]
struct Aggregate {
    successful: Vec<(usize, SuccessEntry)>,
    skipped: Vec<(usize, SkipEntry)>,
    failed: Vec<(usize, FailEntry)>,
}

impl Aggregate {
    fn record(&mut self, index: usize, target: &BuildTarget, outcome: BuildOutcome, attempts: u32) {
        let label = target.label().to_string();
        match outcome {
            BuildOutcome::Success(artifact) => self.successful.push((
                index,
                SuccessEntry {
                    label,
                    artifact: artifact.path,
                    attempts,
                },
            )),
            BuildOutcome::Skipped(reason) => self.skipped.push((index, SkipEntry { label, reason })),
            BuildOutcome::Failed(failure) => self.failed.push((
                index,
                FailEntry {
                    label,
                    detail: failure.detail,
                    attempts,
                },
            )),
        }
    }

    /// Order by position in the target list so completion order is invisible.
    fn freeze(self) -> BuildReport {
        fn ordered<T>(mut entries: Vec<(usize, T)>) -> Vec<T> {
            entries.sort_by_key(|(index, _)| *index);
            entries.into_iter().map(|(_, entry)| entry).collect()
        }
        BuildReport {
            successful: ordered(self.successful),
            skipped: ordered(self.skipped),
            failed: ordered(self.failed),
        }
    }
}

/// Build every target and block until all of them are done.
///
/// `job` is called once per attempt and must be safe to call from several
/// threads for different targets.
pub fn run<F>(
    targets: &[BuildTarget],
    settings: &RunSettings,
    job: F,
    observer: &dyn BuildObserver,
) -> Result<BuildReport>
where
    F: Fn(&BuildTarget) -> BuildOutcome + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.max_concurrency.max(1))
        .thread_name(|i| format!("gox-worker-{i}"))
        .build()?;

    let aggregate = Mutex::new(Aggregate::default());

    pool.install(|| {
        targets.par_iter().enumerate().for_each(|(index, target)| {
            observer.started(target);
            let (outcome, attempts) = run_with_retry(target, &settings.retry, &job, observer);
            observer.finished(target, &outcome, attempts);
            aggregate
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .record(index, target, outcome, attempts);
        });
    });

    Ok(aggregate
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .freeze())
}

/// Attempt one target until it succeeds, is skipped, or runs out of attempts.
pub fn run_with_retry<F>(
    target: &BuildTarget,
    retry: &RetryPolicy,
    job: &F,
    observer: &dyn BuildObserver,
) -> (BuildOutcome, u32)
where
    F: Fn(&BuildTarget) -> BuildOutcome + ?Sized,
{
    let max_attempts = retry.max_attempts();
    let mut attempt = 1;
    loop {
        let outcome = job(target);
        match &outcome {
            BuildOutcome::Failed(failure) if failure.retryable && attempt < max_attempts => {
                let delay = retry.delay_after(attempt);
                observer.attempt_failed(target, attempt, failure, delay);
                std::thread::sleep(delay);
                attempt += 1;
            }
            _ => return (outcome, attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::outcome::Artifact;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn t(label: &str) -> BuildTarget {
        BuildTarget::parse(label).unwrap()
    }

    fn success(target: &BuildTarget) -> BuildOutcome {
        BuildOutcome::Success(Artifact {
            path: PathBuf::from(target.label()),
            compressed: false,
        })
    }

    fn quick(enabled: bool, max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            enabled,
            max_retries,
            base_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_delay_grows_linearly() {
        let retry = RetryPolicy::new(true, 3);
        assert_eq!(retry.delay_after(1), Duration::from_secs(1));
        assert_eq!(retry.delay_after(2), Duration::from_secs(2));
        assert_eq!(retry.delay_after(3), Duration::from_secs(3));
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::new(true, 2).max_attempts(), 3);
        assert_eq!(RetryPolicy::new(false, 2).max_attempts(), 1);
        assert_eq!(RetryPolicy::new(true, u32::MAX).max_attempts(), u32::MAX);
    }

    #[test]
    fn test_unbounded_retries_still_stop_on_success() {
        let calls = AtomicU32::new(0);
        let job = |target: &BuildTarget| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                BuildOutcome::failed("flaky")
            } else {
                success(target)
            }
        };
        let (outcome, attempts) =
            run_with_retry(&t("linux/amd64"), &quick(true, u32::MAX), &job, &Silent);
        assert!(matches!(outcome, BuildOutcome::Success(_)));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_failure_is_retried_until_exhausted() {
        let calls = AtomicU32::new(0);
        let job = |_: &BuildTarget| {
            calls.fetch_add(1, Ordering::SeqCst);
            BuildOutcome::failed("exit status: 1")
        };
        let (outcome, attempts) = run_with_retry(&t("linux/amd64"), &quick(true, 2), &job, &Silent);
        assert!(outcome.is_failed());
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_success_on_second_attempt_stops() {
        let calls = AtomicU32::new(0);
        let job = |target: &BuildTarget| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                BuildOutcome::failed("flaky")
            } else {
                success(target)
            }
        };
        let (outcome, attempts) = run_with_retry(&t("linux/amd64"), &quick(true, 5), &job, &Silent);
        assert!(matches!(outcome, BuildOutcome::Success(_)));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_skip_is_never_retried() {
        let calls = AtomicU32::new(0);
        let job = |_: &BuildTarget| {
            calls.fetch_add(1, Ordering::SeqCst);
            BuildOutcome::Skipped("nope".into())
        };
        let (outcome, attempts) = run_with_retry(&t("ios/arm64"), &quick(true, 4), &job, &Silent);
        assert_eq!(outcome, BuildOutcome::Skipped("nope".into()));
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_permanent_failure_is_not_retried() {
        let job = |_: &BuildTarget| {
            BuildOutcome::Failed(Failure {
                detail: "missing helper".into(),
                retryable: false,
            })
        };
        let (_, attempts) = run_with_retry(&t("ios/arm64"), &quick(true, 4), &job, &Silent);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_run_orders_report_by_target_list() {
        let targets = vec![t("linux/amd64"), t("plan9/arm"), t("ios/arm64"), t("linux/arm64")];
        let job = |target: &BuildTarget| match target.os() {
            "plan9" => BuildOutcome::failed("unsupported"),
            "ios" => BuildOutcome::Skipped("host".into()),
            _ => success(target),
        };
        let settings = RunSettings {
            max_concurrency: 4,
            retry: quick(true, 1),
        };
        let report = run(&targets, &settings, job, &Silent).unwrap();
        assert_eq!(report.successful_labels(), vec!["linux/amd64", "linux/arm64"]);
        assert_eq!(report.skipped_labels(), vec!["ios/arm64"]);
        assert_eq!(report.failed_labels(), vec!["plan9/arm"]);
        assert_eq!(report.failed[0].attempts, 2);
        assert!(!report.is_success());
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let settings = RunSettings {
            max_concurrency: 0,
            retry: quick(false, 0),
        };
        let report = run(&[t("linux/amd64")], &settings, success, &Silent).unwrap();
        assert_eq!(report.successful.len(), 1);
    }
}
