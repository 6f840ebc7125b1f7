//! Per-target skip rules and invocation parameters.
//!
//! Rules are evaluated against an explicit [`PolicyConfig`]; the only
//! interactive piece is the [`Confirm`] hook, whose answers are remembered per
//! OS for the rest of the run.

use crate::platform::BuildTarget;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Platforms that need cgo and therefore a cross C toolchain.
pub const CGO_REQUIRED_OS: &[&str] = &["android", "ios"];

/// Platforms that can only be produced on one host OS.
const HOST_AFFINITY: &[(&str, &str)] = &[("ios", "darwin")];

/// Platforms whose plain `go build` output is experimental enough to ask first.
const CONFIRM_OS: &[&str] = &["android"];

/// Helper that must be installed for host-affine targets.
pub const HELPER_TOOL: &str = "xcodebuild";

/// Used for Android when the user did not pass their own ldflags.
const ANDROID_STATIC_LDFLAGS: &str = "-linkmode=external -extldflags=-static";

/// Static settings the policy decides with.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub skip_cgo: bool,
    pub force: bool,
    /// Treat every confirmation as answered "yes".
    pub no_prompt: bool,
    /// `GOOS` of the machine running the build.
    pub host_os: String,
    /// Whether [`HELPER_TOOL`] was found at startup.
    pub helper_available: bool,
    pub ldflags: Option<String>,
    pub tags: Option<String>,
    /// Extra `GOENV` for the child, see [`crate::host::Host::goenv_override`].
    pub goenv: Option<PathBuf>,
}

/// Asked before building a platform that needs confirmation.
pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}

/// Fixed answer, for `--no-prompt`-like setups and tests.
pub struct Always(pub bool);

impl Confirm for Always {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    /// Build, but tell the user it will probably fail.
    ProceedWithWarning(String),
    Skip(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{target} requires {tool} (install Xcode and the Command Line Tools)")]
    MissingHelper { target: String, tool: &'static str },
}

/// Final compiler command for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Env prefix plus command line, for verbose output.
    pub fn display(&self) -> String {
        let env: Vec<String> = self.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{} {} {}", env.join(" "), self.program, self.args.join(" "))
    }
}

pub struct TargetPolicy {
    config: PolicyConfig,
    confirm: Box<dyn Confirm>,
    answers: Mutex<HashMap<String, bool>>,
}

impl TargetPolicy {
    pub fn new(config: PolicyConfig, confirm: impl Confirm + 'static) -> Self {
        Self {
            config,
            confirm: Box::new(confirm),
            answers: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn should_skip(&self, target: &BuildTarget) -> Decision {
        let os = target.os();

        if self.config.skip_cgo && CGO_REQUIRED_OS.contains(&os) {
            return Decision::Skip(format!(
                "{} needs cgo support (drop --skip-cgo to build it)",
                target.label()
            ));
        }

        let mut decision = Decision::Proceed;

        if let Some((_, required_host)) = HOST_AFFINITY.iter().find(|(t, _)| *t == os)
            && self.config.host_os != *required_host
        {
            if !self.config.force {
                return Decision::Skip(format!(
                    "{} can only be built on {required_host} (use --force to try anyway)",
                    target.label()
                ));
            }
            decision = Decision::ProceedWithWarning(format!(
                "forcing {} on {}, this will probably fail",
                target.label(), self.config.host_os
            ));
        }

        if CONFIRM_OS.contains(&os) && !self.config.no_prompt && !self.confirmed(os) {
            return Decision::Skip(format!("{} declined at prompt", target.label()));
        }

        decision
    }

    fn confirmed(&self, os: &str) -> bool {
        // Held across the prompt so concurrent workers ask one at a time.
        let mut answers = self
            .answers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *answers.entry(os.to_string()).or_insert_with(|| {
            self.confirm.confirm(&format!(
                "Continue building {os} with the standard Go toolchain? (gomobile is recommended)"
            ))
        })
    }

    /// Add target-specific flags and environment to `base` without touching it.
    pub fn prepare(&self, target: &BuildTarget, base: &[String]) -> Result<Invocation, PolicyError> {
        let os = target.os();
        let mut args = base.to_vec();
        let mut env = vec![
            ("GOOS".to_string(), target.os().to_string()),
            ("GOARCH".to_string(), target.arch().to_string()),
        ];

        if HOST_AFFINITY.iter().any(|(t, _)| *t == os) && !self.config.helper_available {
            return Err(PolicyError::MissingHelper {
                target: target.label().to_string(),
                tool: HELPER_TOOL,
            });
        }

        let cgo = if CGO_REQUIRED_OS.contains(&os) { "1" } else { "0" };
        env.push(("CGO_ENABLED".to_string(), cgo.to_string()));

        if os == "android" && self.config.ldflags.is_none() {
            let at = args.iter().position(|a| a == "-o").unwrap_or(args.len());
            args.insert(at, ANDROID_STATIC_LDFLAGS.to_string());
            args.insert(at, "-ldflags".to_string());
        }

        if let Some(goenv) = &self.config.goenv {
            env.push(("GOENV".to_string(), goenv.display().to_string()));
        }

        Ok(Invocation {
            program: "go".to_string(),
            args,
            env,
        })
    }
}

/// `go build` arguments shared by every target.
pub fn base_args(config: &PolicyConfig, output: &Path, source: &Path) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    if let Some(ldflags) = &config.ldflags {
        args.push("-ldflags".to_string());
        args.push(ldflags.clone());
    }
    if let Some(tags) = &config.tags {
        args.push("-tags".to_string());
        args.push(tags.clone());
    }
    args.push("-o".to_string());
    args.push(output.display().to_string());
    args.push(source.display().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(host_os: &str) -> PolicyConfig {
        PolicyConfig {
            host_os: host_os.to_string(),
            helper_available: true,
            ..Default::default()
        }
    }

    fn t(label: &str) -> BuildTarget {
        BuildTarget::parse(label).unwrap()
    }

    fn env<'a>(inv: &'a Invocation, key: &str) -> Option<&'a str> {
        inv.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    struct Counting(Arc<AtomicUsize>, bool);

    impl Confirm for Counting {
        fn confirm(&self, _question: &str) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            self.1
        }
    }

    #[test]
    fn test_skip_cgo_skips_mobile() {
        let policy = TargetPolicy::new(
            PolicyConfig {
                skip_cgo: true,
                ..config("darwin")
            },
            Always(true),
        );
        assert!(matches!(policy.should_skip(&t("ios/arm64")), Decision::Skip(_)));
        assert!(matches!(policy.should_skip(&t("android/arm64")), Decision::Skip(_)));
        assert_eq!(policy.should_skip(&t("linux/amd64")), Decision::Proceed);
    }

    #[test]
    fn test_ios_needs_darwin_host() {
        let policy = TargetPolicy::new(config("linux"), Always(true));
        match policy.should_skip(&t("ios/arm64")) {
            Decision::Skip(reason) => assert!(reason.contains("--force")),
            other => panic!("expected skip, got {other:?}"),
        }

        let on_mac = TargetPolicy::new(config("darwin"), Always(true));
        assert_eq!(on_mac.should_skip(&t("ios/arm64")), Decision::Proceed);
    }

    #[test]
    fn test_force_proceeds_with_warning() {
        let policy = TargetPolicy::new(
            PolicyConfig {
                force: true,
                ..config("windows")
            },
            Always(true),
        );
        assert!(matches!(
            policy.should_skip(&t("ios/arm64")),
            Decision::ProceedWithWarning(_)
        ));
    }

    #[test]
    fn test_missing_helper_fails_prepare() {
        let policy = TargetPolicy::new(
            PolicyConfig {
                force: true,
                helper_available: false,
                ..config("linux")
            },
            Always(true),
        );
        let err = policy.prepare(&t("ios/arm64"), &[]).unwrap_err();
        assert_eq!(
            err,
            PolicyError::MissingHelper {
                target: "ios/arm64".into(),
                tool: HELPER_TOOL
            }
        );
        assert!(policy.prepare(&t("linux/amd64"), &[]).is_ok());
    }

    #[test]
    fn test_declined_prompt_skips_and_is_remembered() {
        let asked = Arc::new(AtomicUsize::new(0));
        let policy = TargetPolicy::new(config("linux"), Counting(asked.clone(), false));
        assert!(matches!(policy.should_skip(&t("android/arm64")), Decision::Skip(_)));
        assert!(matches!(policy.should_skip(&t("android/arm")), Decision::Skip(_)));
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_prompt_never_asks() {
        let asked = Arc::new(AtomicUsize::new(0));
        let policy = TargetPolicy::new(
            PolicyConfig {
                no_prompt: true,
                ..config("linux")
            },
            Counting(asked.clone(), false),
        );
        assert_eq!(policy.should_skip(&t("android/arm64")), Decision::Proceed);
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prepare_sets_env_and_keeps_base() {
        let policy = TargetPolicy::new(config("linux"), Always(true));
        let base = base_args(
            policy.config(),
            Path::new("out/js/wasm/app"),
            Path::new("main.go"),
        );
        let before = base.clone();

        let wasm = policy.prepare(&t("js/wasm"), &base).unwrap();
        assert_eq!(env(&wasm, "GOOS"), Some("js"));
        assert_eq!(env(&wasm, "GOARCH"), Some("wasm"));
        assert_eq!(env(&wasm, "CGO_ENABLED"), Some("0"));
        assert_eq!(wasm.args, before);

        let ios = policy.prepare(&t("ios/arm64"), &base).unwrap();
        assert_eq!(env(&ios, "CGO_ENABLED"), Some("1"));
        assert_eq!(base, before);
    }

    #[test]
    fn test_android_gets_static_ldflags_before_output() {
        let policy = TargetPolicy::new(config("linux"), Always(true));
        let base = base_args(policy.config(), Path::new("app"), Path::new("main.go"));
        let inv = policy.prepare(&t("android/arm64"), &base).unwrap();
        assert_eq!(
            inv.args,
            vec![
                "build",
                "-ldflags",
                ANDROID_STATIC_LDFLAGS,
                "-o",
                "app",
                "main.go"
            ]
        );
        assert_eq!(env(&inv, "CGO_ENABLED"), Some("1"));
    }

    #[test]
    fn test_user_ldflags_win_over_android_default() {
        let policy = TargetPolicy::new(
            PolicyConfig {
                ldflags: Some("-s -w".into()),
                tags: Some("netgo".into()),
                ..config("linux")
            },
            Always(true),
        );
        let base = base_args(policy.config(), Path::new("app"), Path::new("main.go"));
        let inv = policy.prepare(&t("android/arm64"), &base).unwrap();
        assert_eq!(
            inv.args,
            vec!["build", "-ldflags", "-s -w", "-tags", "netgo", "-o", "app", "main.go"]
        );
    }
}
