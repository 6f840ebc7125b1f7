//! # gox CLI Entry Point
//!
//! Parses arguments with clap, layers them over the configuration files and
//! routes to the command handlers.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use gox::build::ReportStatus;
use gox::commands;
use gox::config::{self, BuildSection, Settings};
use gox::host::Host;
use gox::platform::Catalog;
use gox::ui::Console;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "gox")]
#[command(about = "Cross-compile a Go program for many platforms", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = LONG_ABOUT)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    build: BuildArgs,
}

const LONG_ABOUT: &str = "\
Cross-compile a Go program for many platforms in parallel.

Platform groups:
  default    desktop platforms plus android/arm64
  desktop    Windows, Linux, macOS
  server     Linux, FreeBSD
  mobile     Android, iOS (needs cgo toolchains)
  web        WebAssembly
  embedded   ARM, MIPS, RISC-V
  all        everything 'go tool dist list' reports

A bare OS name (e.g. 'illumos') builds the native architecture only;
add --all to build every architecture of that OS.";

/// Flags of the default build command. `None` means "not given", so the
/// config files can fill it in.
#[derive(clap::Args, Debug, Default)]
struct BuildArgs {
    /// Go source file or package to build
    #[arg(short, long)]
    source: Option<PathBuf>,
    /// Output directory [default: ./build]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Binary name [default: source file stem]
    #[arg(short, long)]
    name: Option<String>,
    /// Target platforms: groups, os/arch pairs or OS names, comma separated [default: default]
    #[arg(short, long, value_delimiter = ',')]
    platforms: Option<Vec<String>>,
    /// Verbosity (0 quiet, 1 normal, 2 verbose, 3 debug) [default: 1]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=3))]
    verbose: Option<u8>,
    /// Build targets in parallel [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    parallel: Option<bool>,
    /// Number of parallel workers [default: CPU count]
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Gzip every binary
    #[arg(short, long)]
    compress: bool,
    /// Remove the output directory first
    #[arg(long)]
    clean: bool,
    /// Retry failed targets [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    retry: Option<bool>,
    /// Maximum retries per target [default: 2]
    #[arg(long)]
    max_retries: Option<u32>,
    /// Show a progress bar [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    progress: Option<bool>,
    /// Build every architecture of bare OS names
    #[arg(long)]
    all: bool,
    /// Linker flags passed to go build (e.g. "-s -w")
    #[arg(long, allow_hyphen_values = true)]
    ldflags: Option<String>,
    /// Build tags
    #[arg(long)]
    tags: Option<String>,
    /// Skip platforms that need cgo (android, ios)
    #[arg(long)]
    skip_cgo: bool,
    /// Try host-only platforms anyway (iOS off macOS)
    #[arg(long)]
    force: bool,
    /// Answer yes to every prompt
    #[arg(long)]
    no_prompt: bool,
    /// Write a JSON build report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl From<BuildArgs> for BuildSection {
    fn from(a: BuildArgs) -> Self {
        BuildSection {
            source: a.source,
            output: a.output,
            name: a.name,
            platforms: a.platforms,
            verbose: a.verbose,
            parallel: a.parallel,
            jobs: a.jobs,
            compress: a.compress.then_some(true),
            clean: a.clean.then_some(true),
            retry: a.retry,
            max_retries: a.max_retries,
            progress: a.progress,
            all: a.all.then_some(true),
            ldflags: a.ldflags,
            tags: a.tags,
            skip_cgo: a.skip_cgo.then_some(true),
            force: a.force.then_some(true),
            no_prompt: a.no_prompt.then_some(true),
            report: a.report,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List every platform the Go toolchain supports
    List,
    /// List the platform groups
    Groups,
    /// Show version and environment information
    Version,
    /// Show usage examples
    Examples,
    /// Diagnose toolchain and host issues
    Doctor,
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => {
            commands::platforms::list_platforms(&Catalog::go(&Host::detect()));
            Ok(())
        }
        Some(Commands::Groups) => {
            commands::platforms::list_groups(&Catalog::go(&Host::detect()));
            Ok(())
        }
        Some(Commands::Version) => {
            commands::info::show_version(&Host::detect());
            Ok(())
        }
        Some(Commands::Examples) => {
            commands::info::show_examples();
            Ok(())
        }
        Some(Commands::Doctor) => {
            let host = Host::detect();
            commands::doctor::run_doctor(&host, &Catalog::go(&host))
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        None => build(cli.build),
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let layered = config::load_layers(&cwd)?.overlay(args.into());
    let settings = Settings::from(layered);
    let console = Arc::new(Console::new(settings.verbose));

    let report = match commands::build::run_build(&settings, Arc::clone(&console)) {
        Ok(report) => report,
        Err(e) => {
            console.error(format!("Error: {e:#}"));
            std::process::exit(1);
        }
    };

    if report.status() == ReportStatus::Failed {
        eprintln!(
            "{} Build failed: {} of {} target(s) failed",
            "x".red(),
            report.failed.len(),
            report.total()
        );
        std::process::exit(1);
    }
    Ok(())
}
