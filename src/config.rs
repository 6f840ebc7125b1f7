//! Configuration: built-in defaults, then `~/.gox/config.toml`, then
//! `gox.toml` in the working directory, then command-line flags.
//!
//! ```toml
//! [build]
//! platforms = ["desktop", "js/wasm"]
//! output = "dist"
//! ldflags = "-s -w"
//! max_retries = 1
//! ```

use crate::build::{PolicyConfig, RetryPolicy};
use crate::error::{BuildError, Result};
use crate::host::Host;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG: &str = "gox.toml";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GoxConfig {
    #[serde(default)]
    pub build: BuildSection,
}

/// One configuration layer. Unset fields fall through to the layer below.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub name: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub verbose: Option<u8>,
    pub parallel: Option<bool>,
    pub jobs: Option<usize>,
    pub compress: Option<bool>,
    pub clean: Option<bool>,
    pub retry: Option<bool>,
    pub max_retries: Option<u32>,
    pub progress: Option<bool>,
    pub all: Option<bool>,
    pub ldflags: Option<String>,
    pub tags: Option<String>,
    pub skip_cgo: Option<bool>,
    pub force: Option<bool>,
    pub no_prompt: Option<bool>,
    pub report: Option<PathBuf>,
}

impl BuildSection {
    /// `upper` wins wherever it sets a value.
    pub fn overlay(self, upper: BuildSection) -> BuildSection {
        BuildSection {
            source: upper.source.or(self.source),
            output: upper.output.or(self.output),
            name: upper.name.or(self.name),
            platforms: upper.platforms.or(self.platforms),
            verbose: upper.verbose.or(self.verbose),
            parallel: upper.parallel.or(self.parallel),
            jobs: upper.jobs.or(self.jobs),
            compress: upper.compress.or(self.compress),
            clean: upper.clean.or(self.clean),
            retry: upper.retry.or(self.retry),
            max_retries: upper.max_retries.or(self.max_retries),
            progress: upper.progress.or(self.progress),
            all: upper.all.or(self.all),
            ldflags: upper.ldflags.or(self.ldflags),
            tags: upper.tags.or(self.tags),
            skip_cgo: upper.skip_cgo.or(self.skip_cgo),
            force: upper.force.or(self.force),
            no_prompt: upper.no_prompt.or(self.no_prompt),
            report: upper.report.or(self.report),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: Option<PathBuf>,
    pub output: PathBuf,
    pub name: Option<String>,
    /// Comma-joined platform specification.
    pub platforms: String,
    pub verbose: u8,
    pub parallel: bool,
    pub jobs: Option<usize>,
    pub compress: bool,
    pub clean: bool,
    pub retry: bool,
    pub max_retries: u32,
    pub progress: bool,
    pub all: bool,
    pub ldflags: Option<String>,
    pub tags: Option<String>,
    pub skip_cgo: bool,
    pub force: bool,
    pub no_prompt: bool,
    pub report: Option<PathBuf>,
}

impl From<BuildSection> for Settings {
    fn from(s: BuildSection) -> Self {
        let platforms = s
            .platforms
            .filter(|p| !p.is_empty())
            .map(|p| p.join(","))
            .unwrap_or_else(|| "default".to_string());
        Self {
            source: s.source,
            output: s.output.unwrap_or_else(|| PathBuf::from("./build")),
            name: s.name.filter(|n| !n.is_empty()),
            platforms,
            verbose: s.verbose.unwrap_or(1).min(3),
            parallel: s.parallel.unwrap_or(true),
            jobs: s.jobs,
            compress: s.compress.unwrap_or(false),
            clean: s.clean.unwrap_or(false),
            retry: s.retry.unwrap_or(true),
            max_retries: s.max_retries.unwrap_or(2),
            progress: s.progress.unwrap_or(true),
            all: s.all.unwrap_or(false),
            ldflags: s.ldflags.filter(|f| !f.is_empty()),
            tags: s.tags.filter(|t| !t.is_empty()),
            skip_cgo: s.skip_cgo.unwrap_or(false),
            force: s.force.unwrap_or(false),
            no_prompt: s.no_prompt.unwrap_or(false),
            report: s.report,
        }
    }
}

impl Settings {
    /// `-n`, or the source file stem (`cmd/server/main.go` gives `main`,
    /// `./cmd/server` gives `server`).
    pub fn binary_name(&self, source: &Path) -> String {
        self.name.clone().unwrap_or_else(|| {
            source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty() && s != ".")
                .unwrap_or_else(|| "app".to_string())
        })
    }

    /// 1 without `--parallel`, else `--jobs` or the host's CPU count.
    pub fn max_concurrency(&self, host: &Host) -> usize {
        if !self.parallel {
            return 1;
        }
        self.jobs.unwrap_or(host.cpus).max(1)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry, self.max_retries)
    }

    pub fn policy_config(&self, host: &Host, helper_available: bool) -> PolicyConfig {
        PolicyConfig {
            skip_cgo: self.skip_cgo,
            force: self.force,
            no_prompt: self.no_prompt,
            host_os: host.os.clone(),
            helper_available,
            ldflags: self.ldflags.clone(),
            tags: self.tags.clone(),
            goenv: host.goenv_override(),
        }
    }
}

/// Parse one config file; a missing file is not an error.
pub fn load_file(path: &Path) -> Result<Option<BuildSection>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(BuildError::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let config: GoxConfig = toml::from_str(&content).map_err(|source| BuildError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config.build))
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gox").join("config.toml"))
}

/// Global then project file, each overlaying the previous.
pub fn load_layers(project_dir: &Path) -> Result<BuildSection> {
    let mut merged = BuildSection::default();
    let layers = [
        global_config_path(),
        Some(project_dir.join(PROJECT_CONFIG)),
    ];
    for path in layers.into_iter().flatten() {
        if let Some(layer) = load_file(&path)? {
            merged = merged.overlay(layer);
        }
    }
    Ok(merged)
}
