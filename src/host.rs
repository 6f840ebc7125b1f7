//! Facts about the machine running the build.
//!
//! Everything here is read once at startup and then passed around as a plain
//! [`Host`] value, so resolution and policy never look at the environment
//! themselves.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Go environment file shipped by the Android module installer.
const ANDROID_GOENV: &str = "/data/adb/modules/gogogo/go.env";

/// The invoking machine, described with Go's platform names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// `GOOS` spelling of the host OS (`darwin`, not `macos`).
    pub os: String,
    /// `GOARCH` spelling of the host architecture (`amd64`, not `x86_64`).
    pub arch: String,
    /// Available hardware parallelism, at least 1.
    pub cpus: usize,
    /// `GOENV` file every `go` invocation must see.
    pub goenv: Option<PathBuf>,
}

impl Host {
    pub fn detect() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let os = go_os(std::env::consts::OS).to_string();
        let goenv = android_goenv(&os);
        Self {
            os,
            arch: go_arch(std::env::consts::ARCH, cfg!(target_endian = "little")).to_string(),
            cpus,
            goenv,
        }
    }

    /// Build a host by hand, mainly for tests.
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
            cpus: 1,
            goenv: None,
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }

    pub fn goenv_override(&self) -> Option<PathBuf> {
        self.goenv.clone()
    }

    /// `go` with this host's `GOENV` applied.
    pub fn go_command(&self) -> Command {
        go_command(self.goenv.as_deref())
    }

    /// First line of `go version`, or `None` if go does not run.
    pub fn go_version(&self) -> Option<String> {
        let output = self.go_command().arg("version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// On Android the Go toolchain lives in a Magisk module and needs its own
/// `GOENV` file.
fn android_goenv(os: &str) -> Option<PathBuf> {
    if os != "android" {
        return None;
    }
    let path = PathBuf::from(ANDROID_GOENV);
    path.exists().then_some(path)
}

pub fn go_command(goenv: Option<&Path>) -> Command {
    let mut cmd = Command::new("go");
    if let Some(goenv) = goenv {
        cmd.env("GOENV", goenv);
    }
    cmd
}

/// Map `std::env::consts::OS` to `GOOS`.
pub fn go_os(rust_os: &str) -> &str {
    match rust_os {
        "macos" => "darwin",
        other => other,
    }
}

/// Map `std::env::consts::ARCH` to `GOARCH`. Go spells little-endian
/// `ppc64` and `mips` variants with an `le` suffix.
pub fn go_arch(rust_arch: &str, little_endian: bool) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" if little_endian => "ppc64le",
        "powerpc64" => "ppc64",
        "mips64" if little_endian => "mips64le",
        "mips" if little_endian => "mipsle",
        "loongarch64" => "loong64",
        "s390x" => "s390x",
        "wasm32" => "wasm",
        other => other,
    }
}

/// Probe a tool by running it with a harmless argument.
pub fn tool_available(tool: &str, probe_arg: &str) -> bool {
    Command::new(tool)
        .arg(probe_arg)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
