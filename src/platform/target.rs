use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// One `os/arch` pair to build for.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct BuildTarget {
    os: String,
    arch: String,
    /// Canonical `os/arch`.
    label: String,
}

impl BuildTarget {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
            label: format!("{os}/{arch}"),
        }
    }

    /// Parse an `os/arch` label. Returns `None` unless there are exactly two
    /// segments, each usable as a single directory name.
    pub fn parse(label: &str) -> Option<Self> {
        let mut parts = label.trim().split('/');
        let os = parts.next()?.trim();
        let arch = parts.next()?.trim();
        if parts.next().is_some() || !is_path_segment(os) || !is_path_segment(arch) {
            return None;
        }
        Some(Self::new(os, arch))
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// File name of the produced binary.
    pub fn binary_file_name(&self, base: &str) -> String {
        if self.os == "windows" {
            format!("{base}.exe")
        } else {
            base.to_string()
        }
    }

    /// `<root>/<os>/<arch>/<binary>`. For parsed targets both segments are
    /// plain names, so distinct targets never share a directory.
    pub fn artifact_path(&self, root: &Path, base: &str) -> PathBuf {
        root.join(&self.os)
            .join(&self.arch)
            .join(self.binary_file_name(base))
    }
}

/// Non-empty, not `.` or `..`, and free of path separators.
fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['\\', ':'])
}

impl PartialEq for BuildTarget {
    fn eq(&self, other: &Self) -> bool {
        self.os == other.os && self.arch == other.arch
    }
}

impl Hash for BuildTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.os.hash(state);
        self.arch.hash(state);
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_valid_label() {
        let t = BuildTarget::parse("linux/arm64").unwrap();
        assert_eq!(t.os(), "linux");
        assert_eq!(t.arch(), "arm64");
        assert_eq!(t.label(), "linux/arm64");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BuildTarget::parse("linux").is_none());
        assert!(BuildTarget::parse("linux/arm/v7").is_none());
        assert!(BuildTarget::parse("/amd64").is_none());
        assert!(BuildTarget::parse("linux/").is_none());
    }

    #[test]
    fn test_parse_rejects_path_like_segments() {
        for label in ["linux/.", "./linux", "../x", "linux/..", "linux/a\\b", "c:/amd64"] {
            assert!(BuildTarget::parse(label).is_none(), "{label} should not parse");
        }
    }

    #[test]
    fn test_windows_gets_exe_suffix() {
        let win = BuildTarget::new("windows", "amd64");
        let lin = BuildTarget::new("linux", "amd64");
        assert_eq!(win.binary_file_name("app"), "app.exe");
        assert_eq!(lin.binary_file_name("app"), "app");
    }

    #[test]
    fn test_artifact_paths_do_not_collide() {
        let root = Path::new("build");
        let targets = [
            BuildTarget::new("linux", "amd64"),
            BuildTarget::new("linux", "arm64"),
            BuildTarget::new("windows", "amd64"),
            BuildTarget::new("darwin", "amd64"),
            BuildTarget::new("js", "wasm"),
        ];
        let paths: HashSet<PathBuf> = targets
            .iter()
            .map(|t| t.artifact_path(root, "app"))
            .collect();
        assert_eq!(paths.len(), targets.len());
        assert_eq!(
            targets[2].artifact_path(root, "app"),
            Path::new("build/windows/amd64/app.exe")
        );
    }

    #[test]
    fn test_parse_trims_into_canonical_label() {
        let a = BuildTarget::new("linux", "amd64");
        let b = BuildTarget::parse(" linux / amd64 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.label(), "linux/amd64");
        assert_eq!(b.to_string(), "linux/amd64");
    }
}
