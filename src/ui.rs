//! Terminal output.
//!
//! [`Console`] is the only place that prints. It filters by verbosity and,
//! while a progress bar is running, routes lines through the bar so they
//! don't tear it.
//!
//! | level | shows                                   |
//! |-------|-----------------------------------------|
//! | 0     | errors only                             |
//! | 1     | progress, warnings, per-target results  |
//! | 2     | compiler command lines, retry notices   |
//! | 3     | catalog and configuration details       |

use crate::build::{BuildObserver, BuildOutcome, Failure, policy::Confirm};
use crate::platform::BuildTarget;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cmp;
use std::sync::Mutex;
use std::time::Duration;

pub const QUIET: u8 = 0;
pub const NORMAL: u8 = 1;
pub const VERBOSE: u8 = 2;
pub const DEBUG: u8 = 3;

pub struct Console {
    verbosity: u8,
    bar: Mutex<Option<ProgressBar>>,
}

impl Console {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            bar: Mutex::new(None),
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self::new(QUIET)
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn enabled(&self, level: u8) -> bool {
        self.verbosity >= level
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.emit(NORMAL, format!("{} {}", "ℹ".blue(), msg.as_ref()));
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.emit(NORMAL, format!("{} {}", "✓".green(), msg.as_ref()));
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.emit(NORMAL, format!("{} {}", "!".yellow(), msg.as_ref()));
    }

    pub fn hint(&self, msg: impl AsRef<str>) {
        self.emit(NORMAL, format!("   {} {}", "💡".yellow(), msg.as_ref()));
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.emit(QUIET, format!("{} {}", "x".red(), msg.as_ref()));
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.emit(VERBOSE, format!("   {}", msg.as_ref().dimmed()));
    }

    pub fn trace(&self, msg: impl AsRef<str>) {
        self.emit(DEBUG, format!("   {} {}", "·".dimmed(), msg.as_ref().dimmed()));
    }

    fn emit(&self, level: u8, line: String) {
        if !self.enabled(level) {
            return;
        }
        match self.current_bar() {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ if level == QUIET => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    fn current_bar(&self) -> Option<ProgressBar> {
        self.bar
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Start a bar for `len` targets. Hidden below [`NORMAL`].
    pub fn start_progress(&self, len: usize) -> ProgressBar {
        let bar = if self.enabled(NORMAL) {
            let bar = ProgressBar::new(len as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("█▓░"));
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        *self.bar.lock().unwrap_or_else(|p| p.into_inner()) = Some(bar.clone());
        bar
    }

    pub fn finish_progress(&self) {
        if let Some(bar) = self.bar.lock().unwrap_or_else(|p| p.into_inner()).take() {
            bar.finish_and_clear();
        }
    }
}

impl Confirm for Console {
    fn confirm(&self, question: &str) -> bool {
        let ask = || {
            inquire::Confirm::new(question)
                .with_default(false)
                .prompt()
                .unwrap_or(false)
        };
        match self.current_bar() {
            Some(bar) if !bar.is_hidden() => bar.suspend(ask),
            _ => ask(),
        }
    }
}

impl Confirm for std::sync::Arc<Console> {
    fn confirm(&self, question: &str) -> bool {
        self.as_ref().confirm(question)
    }
}

/// Reports per-target results on the console and advances the bar.
pub struct ProgressObserver<'a> {
    console: &'a Console,
    bar: ProgressBar,
}

impl<'a> ProgressObserver<'a> {
    pub fn new(console: &'a Console, bar: ProgressBar) -> Self {
        Self { console, bar }
    }
}

impl BuildObserver for ProgressObserver<'_> {
    fn started(&self, target: &BuildTarget) {
        self.bar.set_message(format!("building {}", target.label()));
    }

    fn attempt_failed(&self, target: &BuildTarget, attempt: u32, failure: &Failure, delay: Duration) {
        self.console.debug(format!(
            "{} attempt {attempt} failed, retrying in {delay:?}: {}",
            target.label(),
            failure.detail.lines().next().unwrap_or_default()
        ));
    }

    fn finished(&self, target: &BuildTarget, outcome: &BuildOutcome, attempts: u32) {
        match outcome {
            BuildOutcome::Success(artifact) if attempts > 1 => self.console.success(format!(
                "{} ({}, after {attempts} attempts)",
                target.label().bold(),
                artifact.path.display()
            )),
            BuildOutcome::Success(artifact) => self.console.success(format!(
                "{} ({})",
                target.label().bold(),
                artifact.path.display()
            )),
            BuildOutcome::Skipped(reason) => self.console.emit(
                NORMAL,
                format!("{} {} (skipped: {reason})", "⏭".yellow(), target.label()),
            ),
            BuildOutcome::Failed(_) => self.console.error(format!("{} failed", target.label().bold())),
        }
        self.bar.inc(1);
    }
}

/// Box-drawn table sized to the terminal.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], console::measure_text_width(&flatten(cell)));
            }
        }

        // Shrink the widest column until the table fits, never below 8.
        let overhead = 3 + 3 * widths.len();
        let budget = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > budget {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);
        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {left}{}{right}", segments.join(mid))
        };
        let line = |cells: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let text = console::truncate_str(&flatten(cell), *width, "...").to_string();
                let pad = width.saturating_sub(console::measure_text_width(&text));
                let text = if bold { text.bold().to_string() } else { text };
                out.push_str(&format!(" {text}{} │", " ".repeat(pad)));
            }
            out
        };

        let mut lines = vec![rule("┌", "┬", "┐"), line(self.headers.as_slice(), true), rule("├", "┼", "┤")];
        lines.extend(self.rows.iter().map(|row| line(row.as_slice(), false)));
        lines.push(rule("└", "┴", "┘"));
        lines
    }

    pub fn print(&self) {
        let (_, width) = console::Term::stdout().size();
        for line in self.render(width as usize) {
            println!("{line}");
        }
    }
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect()
}
