//! `gox -s <source>`: the main build command.

use crate::build::{
    self, BuildReport, Compiler, Executor, GoCompiler, Job, ReportStatus, RunSettings,
    TargetPolicy, policy::HELPER_TOOL,
};
use crate::config::Settings;
use crate::error::BuildError;
use crate::host::{self, Host};
use crate::platform::{self, BuildTarget, Catalog, ResolveOptions};
use crate::ui::{Console, ProgressObserver};
use anyhow::{Context, Result, anyhow};
use colored::*;
use std::fs;
use std::sync::Arc;

/// Check preconditions, resolve targets, build them and print the summary.
pub fn run_build(settings: &Settings, console: Arc<Console>) -> Result<BuildReport> {
    let host = Host::detect();
    let version = host.go_version().ok_or_else(|| {
        BuildError::ToolchainNotFound("make sure Go is installed and on PATH".into())
    })?;
    console.success(version);

    let source = settings
        .source
        .clone()
        .ok_or_else(|| anyhow!("no source given, use -s <file> (see 'gox --help')"))?;
    if !source.exists() {
        return Err(BuildError::SourceNotFound { path: source }.into());
    }
    let binary_name = settings.binary_name(&source);

    if settings.clean {
        build::clean_output_dir(&settings.output, &console)?;
    }

    let catalog = Catalog::go(&host);
    let targets = resolve_targets(settings, &host, &catalog, &console)?;
    announce_mobile(&targets, &console);

    let helper_available = targets.iter().any(|t| t.os() == "ios")
        && host::tool_available(HELPER_TOOL, "-version");
    let policy = TargetPolicy::new(
        settings.policy_config(&host, helper_available),
        Arc::clone(&console),
    );
    let job = Job {
        source,
        output_root: settings.output.clone(),
        binary_name,
        compress: settings.compress,
    };
    let run = RunSettings {
        max_concurrency: settings.max_concurrency(&host),
        retry: settings.retry_policy(),
    };
    console.trace(format!(
        "host {} · {} worker(s) · {} attempt(s) per target",
        host.label(),
        run.max_concurrency,
        run.retry.max_attempts()
    ));

    let report = build_targets(
        &targets,
        &job,
        &run,
        &policy,
        &GoCompiler,
        &console,
        settings.progress,
    )?;
    print_summary(&report, &console);

    if let Some(path) = &settings.report {
        let json = report.to_json()?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        console.info(format!("Report written to {}", path.display()));
    }

    Ok(report)
}

/// Resolve `settings.platforms`, printing every diagnostic. Empty is fatal.
pub fn resolve_targets(
    settings: &Settings,
    host: &Host,
    catalog: &Catalog,
    console: &Console,
) -> Result<Vec<BuildTarget>, BuildError> {
    let options = ResolveOptions {
        all_archs: settings.all,
        native_arch: host.arch.clone(),
    };
    let resolution = platform::resolve(&settings.platforms, &options, catalog);
    for warning in &resolution.warnings {
        console.warn(warning.to_string());
    }
    if resolution.targets.is_empty() {
        return Err(BuildError::NoTargets {
            spec: settings.platforms.clone(),
        });
    }
    console.trace(format!(
        "resolved '{}' to {}",
        settings.platforms,
        resolution
            .targets
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    Ok(resolution.targets)
}

/// Create the output root and run every target through the executor.
pub fn build_targets(
    targets: &[BuildTarget],
    job: &Job,
    run: &RunSettings,
    policy: &TargetPolicy,
    compiler: &dyn Compiler,
    console: &Console,
    progress: bool,
) -> Result<BuildReport, BuildError> {
    fs::create_dir_all(&job.output_root).map_err(|source| BuildError::OutputDir {
        path: job.output_root.clone(),
        source,
    })?;

    console.info(format!("Building {} target platform(s)", targets.len()));

    let executor = Executor {
        policy,
        compiler,
        job,
        console,
    };
    let bar = if progress {
        console.start_progress(targets.len())
    } else {
        indicatif::ProgressBar::hidden()
    };
    let observer = ProgressObserver::new(console, bar);
    let report = build::run(targets, run, |t| executor.execute(t), &observer);
    console.finish_progress();
    report
}

fn announce_mobile(targets: &[BuildTarget], console: &Console) {
    if targets.iter().any(|t| t.os() == "android" || t.os() == "ios") {
        console.hint("Android and iOS are best built with gomobile:");
        console.hint("go install golang.org/x/mobile/cmd/gomobile@latest && gomobile init");
    }
}

pub fn print_summary(report: &BuildReport, console: &Console) {
    if !report.failed.is_empty() {
        console.error(format!("{} target(s) failed:", report.failed.len()));
        for entry in &report.failed {
            console.error(format!("  • {}", entry.detail));
        }
    }

    if !report.successful.is_empty() {
        console.success(format!(
            "Built {} target platform(s): {}",
            report.successful.len(),
            report.successful_labels().join(", ")
        ));
    }

    if !report.skipped.is_empty() {
        console.warn(format!(
            "Skipped {} target platform(s): {}",
            report.skipped.len(),
            report.skipped_labels().join(", ").yellow()
        ));
    }

    if report.status() == ReportStatus::NothingBuilt {
        console.hint("Every platform was skipped, nothing was built.");
    }
}
