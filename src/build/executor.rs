//! Builds one target: policy check, output directory, compiler, compression.

use super::compress;
use super::outcome::{Artifact, BuildOutcome, Failure};
use super::policy::{Decision, Invocation, TargetPolicy, base_args};
use crate::platform::BuildTarget;
use crate::ui::Console;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// What the compiler reported for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub success: bool,
    /// Human-readable exit status, e.g. `exit status: 2`.
    pub status: String,
    /// stdout followed by stderr.
    pub output: String,
}

/// The external compiler. Implemented by [`GoCompiler`] and by test fakes.
pub trait Compiler: Send + Sync {
    fn compile(&self, invocation: &Invocation) -> io::Result<CompileOutput>;
}

/// Runs the invocation as a subprocess with the parent's environment plus the
/// prepared variables.
pub struct GoCompiler;

impl Compiler for GoCompiler {
    fn compile(&self, invocation: &Invocation) -> io::Result<CompileOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CompileOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            output: combined,
        })
    }
}

/// Per-run inputs shared by all targets.
#[derive(Debug, Clone)]
pub struct Job {
    /// Go file or package to build.
    pub source: PathBuf,
    pub output_root: PathBuf,
    pub binary_name: String,
    pub compress: bool,
}

pub struct Executor<'a> {
    pub policy: &'a TargetPolicy,
    pub compiler: &'a dyn Compiler,
    pub job: &'a Job,
    pub console: &'a Console,
}

impl Executor<'_> {
    /// Exactly one outcome per call. Only writes below the target's own
    /// `<os>/<arch>` directory.
    pub fn execute(&self, target: &BuildTarget) -> BuildOutcome {
        match self.policy.should_skip(target) {
            Decision::Skip(reason) => return BuildOutcome::Skipped(reason),
            Decision::ProceedWithWarning(warning) => self.console.warn(warning),
            Decision::Proceed => {}
        }

        let output_path = target.artifact_path(&self.job.output_root, &self.job.binary_name);
        let base = base_args(self.policy.config(), &output_path, &self.job.source);
        let invocation = match self.policy.prepare(target, &base) {
            Ok(invocation) => invocation,
            Err(e) => {
                return BuildOutcome::Failed(Failure {
                    detail: e.to_string(),
                    retryable: false,
                });
            }
        };

        if let Some(dir) = output_path.parent()
            && let Err(e) = fs::create_dir_all(dir)
        {
            return BuildOutcome::failed(format!(
                "[{}] failed to create {}: {e}",
                target.label(),
                dir.display()
            ));
        }

        self.console.debug(format!("$ {}", invocation.display()));

        let result = match self.compiler.compile(&invocation) {
            Ok(result) => result,
            Err(e) => {
                return BuildOutcome::failed(format!(
                    "[{}] failed to run {}: {e}",
                    target.label(), invocation.program
                ));
            }
        };

        if !result.success {
            return BuildOutcome::failed(format!(
                "[{}] build failed ({})\n{}",
                target.label(),
                result.status,
                result.output.trim_end()
            ));
        }

        let mut artifact = Artifact {
            path: output_path,
            compressed: false,
        };

        if self.job.compress {
            match compress::gzip_replace(&artifact.path) {
                Ok(gz) => {
                    artifact.path = gz;
                    artifact.compressed = true;
                }
                // The binary is still there; compression is best effort.
                Err(e) => self
                    .console
                    .warn(format!("[{}] compression failed: {e}", target.label())),
            }
        }

        BuildOutcome::Success(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::policy::{Always, PolicyConfig};
    use std::sync::Mutex;

    /// Writes a fake artifact at the `-o` path, or fails for listed OSes.
    struct Fake {
        fail_os: Vec<&'static str>,
        write_artifact: bool,
        seen: Mutex<Vec<Invocation>>,
    }

    impl Fake {
        fn new(fail_os: Vec<&'static str>) -> Self {
            Self {
                fail_os,
                write_artifact: true,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Compiler for Fake {
        fn compile(&self, invocation: &Invocation) -> io::Result<CompileOutput> {
            self.seen.lock().unwrap().push(invocation.clone());
            let goos = invocation
                .env
                .iter()
                .find(|(k, _)| k == "GOOS")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            if self.fail_os.iter().any(|os| *os == goos) {
                return Ok(CompileOutput {
                    success: false,
                    status: "exit status: 2".into(),
                    output: "cmd/link: unsupported GOOS\n".into(),
                });
            }
            if self.write_artifact {
                let out = invocation
                    .args
                    .iter()
                    .position(|a| a == "-o")
                    .map(|i| invocation.args[i + 1].clone())
                    .unwrap();
                fs::write(out, b"binary")?;
            }
            Ok(CompileOutput {
                success: true,
                status: "exit status: 0".into(),
                output: String::new(),
            })
        }
    }

    fn policy(config: PolicyConfig) -> TargetPolicy {
        TargetPolicy::new(config, Always(true))
    }

    fn linux_host() -> PolicyConfig {
        PolicyConfig {
            host_os: "linux".into(),
            helper_available: true,
            ..Default::default()
        }
    }

    fn job(root: &std::path::Path, compress: bool) -> Job {
        Job {
            source: PathBuf::from("main.go"),
            output_root: root.to_path_buf(),
            binary_name: "app".into(),
            compress,
        }
    }

    fn t(label: &str) -> BuildTarget {
        BuildTarget::parse(label).unwrap()
    }

    #[test]
    fn test_success_writes_into_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(linux_host());
        let compiler = Fake::new(vec![]);
        let job = job(dir.path(), false);
        let console = Console::quiet();
        let exec = Executor {
            policy: &policy,
            compiler: &compiler,
            job: &job,
            console: &console,
        };

        match exec.execute(&t("windows/amd64")) {
            BuildOutcome::Success(artifact) => {
                assert_eq!(artifact.path, dir.path().join("windows/amd64/app.exe"));
                assert!(artifact.path.exists());
                assert!(!artifact.compressed);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_skipped_target_never_reaches_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(linux_host());
        let compiler = Fake::new(vec![]);
        let job = job(dir.path(), false);
        let console = Console::quiet();
        let exec = Executor {
            policy: &policy,
            compiler: &compiler,
            job: &job,
            console: &console,
        };

        assert!(matches!(exec.execute(&t("ios/arm64")), BuildOutcome::Skipped(_)));
        assert!(compiler.seen.lock().unwrap().is_empty());
        assert!(!dir.path().join("ios").exists());
    }

    #[test]
    fn test_compiler_failure_carries_label_status_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(linux_host());
        let compiler = Fake::new(vec!["plan9"]);
        let job = job(dir.path(), false);
        let console = Console::quiet();
        let exec = Executor {
            policy: &policy,
            compiler: &compiler,
            job: &job,
            console: &console,
        };

        match exec.execute(&t("plan9/arm")) {
            BuildOutcome::Failed(failure) => {
                assert!(failure.retryable);
                assert!(failure.detail.contains("plan9/arm"));
                assert!(failure.detail.contains("exit status: 2"));
                assert!(failure.detail.contains("unsupported GOOS"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_helper_is_permanent_failure() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(PolicyConfig {
            force: true,
            helper_available: false,
            ..linux_host()
        });
        let compiler = Fake::new(vec![]);
        let job = job(dir.path(), false);
        let console = Console::quiet();
        let exec = Executor {
            policy: &policy,
            compiler: &compiler,
            job: &job,
            console: &console,
        };

        match exec.execute(&t("ios/arm64")) {
            BuildOutcome::Failed(failure) => assert!(!failure.retryable),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(compiler.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_compression_replaces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(linux_host());
        let compiler = Fake::new(vec![]);
        let job = job(dir.path(), true);
        let console = Console::quiet();
        let exec = Executor {
            policy: &policy,
            compiler: &compiler,
            job: &job,
            console: &console,
        };

        match exec.execute(&t("linux/arm64")) {
            BuildOutcome::Success(artifact) => {
                assert!(artifact.compressed);
                assert_eq!(artifact.path, dir.path().join("linux/arm64/app.gz"));
                assert!(!dir.path().join("linux/arm64/app").exists());
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_compression_failure_keeps_success() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(linux_host());
        let mut compiler = Fake::new(vec![]);
        compiler.write_artifact = false;
        let job = job(dir.path(), true);
        let console = Console::quiet();
        let exec = Executor {
            policy: &policy,
            compiler: &compiler,
            job: &job,
            console: &console,
        };

        match exec.execute(&t("linux/amd64")) {
            BuildOutcome::Success(artifact) => {
                assert!(!artifact.compressed);
                assert_eq!(artifact.path, dir.path().join("linux/amd64/app"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }
}
