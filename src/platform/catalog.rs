//! The set of platforms the toolchain can target.
//!
//! Discovery runs `go tool dist list` at most once per run. When it is not
//! available a built-in list of well-known platforms stands in.

use super::BuildTarget;
use crate::host::{self, Host};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Used when discovery fails.
pub const FALLBACK_PLATFORMS: &[&str] = &[
    "windows/amd64",
    "windows/386",
    "windows/arm64",
    "linux/amd64",
    "linux/386",
    "linux/arm64",
    "linux/arm",
    "darwin/amd64",
    "darwin/arm64",
    "freebsd/amd64",
    "freebsd/arm64",
    "android/arm64",
    "android/arm",
    "ios/amd64",
    "ios/arm64",
    "js/wasm",
    "linux/mips",
    "linux/mips64",
    "linux/riscv64",
    "openbsd/amd64",
    "netbsd/amd64",
    "dragonfly/amd64",
    "solaris/amd64",
];

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}")]
    Status { command: String, status: String },
}

/// Source of the raw `os/arch` lines.
pub trait PlatformDiscovery: Send + Sync {
    fn discover(&self) -> Result<Vec<String>, DiscoveryError>;
}

/// Asks the Go toolchain via `go tool dist list`.
pub struct GoDistList {
    goenv: Option<PathBuf>,
}

impl GoDistList {
    pub fn for_host(host: &Host) -> Self {
        Self {
            goenv: host.goenv_override(),
        }
    }
}

impl PlatformDiscovery for GoDistList {
    fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        let command = "go tool dist list".to_string();
        let output = host::go_command(self.goenv.as_deref())
            .args(["tool", "dist", "list"])
            .output()
            .map_err(|source| DiscoveryError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(DiscoveryError::Status {
                command,
                status: output.status.to_string(),
            });
        }
        Ok(parse_dist_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Keep the non-empty lines that look like `os/arch`.
pub fn parse_dist_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains('/'))
        .map(str::to_string)
        .collect()
}

/// Where a catalog's entries came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Discovered,
    /// Discovery failed with the given message.
    Fallback(String),
}

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub entries: Vec<BuildTarget>,
    pub source: CatalogSource,
}

/// Lazily discovered, then frozen, platform catalog.
pub struct Catalog {
    discovery: Box<dyn PlatformDiscovery>,
    snapshot: OnceLock<CatalogSnapshot>,
}

impl Catalog {
    pub fn new(discovery: impl PlatformDiscovery + 'static) -> Self {
        Self {
            discovery: Box::new(discovery),
            snapshot: OnceLock::new(),
        }
    }

    /// Catalog backed by the local Go toolchain.
    pub fn go(host: &Host) -> Self {
        Self::new(GoDistList::for_host(host))
    }

    /// Runs discovery on first use only.
    pub fn snapshot(&self) -> &CatalogSnapshot {
        self.snapshot.get_or_init(|| match self.discovery.discover() {
            Ok(lines) => CatalogSnapshot {
                entries: lines.iter().filter_map(|l| BuildTarget::parse(l)).collect(),
                source: CatalogSource::Discovered,
            },
            Err(e) => CatalogSnapshot {
                entries: fallback_targets(),
                source: CatalogSource::Fallback(e.to_string()),
            },
        })
    }

    pub fn entries(&self) -> &[BuildTarget] {
        &self.snapshot().entries
    }

    pub fn source(&self) -> &CatalogSource {
        &self.snapshot().source
    }

    /// Architectures listed for `os`, in catalog order.
    pub fn archs_for(&self, os: &str) -> Vec<&str> {
        self.entries()
            .iter()
            .filter(|t| t.os() == os)
            .map(|t| t.arch())
            .collect()
    }

    /// Catalog entries grouped by OS, OS order by first appearance.
    pub fn by_os(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for t in self.entries() {
            match groups.iter_mut().find(|(os, _)| *os == t.os()) {
                Some((_, archs)) => archs.push(t.arch()),
                None => groups.push((t.os(), vec![t.arch()])),
            }
        }
        groups
    }
}

pub fn fallback_targets() -> Vec<BuildTarget> {
    FALLBACK_PLATFORMS
        .iter()
        .filter_map(|l| BuildTarget::parse(l))
        .collect()
}
