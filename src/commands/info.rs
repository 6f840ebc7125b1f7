//! `gox version` and `gox examples`.

use crate::host::Host;
use colored::*;

pub fn show_version(host: &Host) {
    println!(
        "{} v{} - cross-compile Go programs for many platforms",
        "gox".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("{}", "Features:".bold());
    for feature in [
        "parallel builds across platforms",
        "retries with backoff",
        "progress bar",
        "gzip compression",
        "Android host support",
        "single OS names (native or --all architectures)",
    ] {
        println!("  {} {}", "✓".green(), feature);
    }
    println!();
    println!("{}", "Environment:".bold());
    println!(
        "  Go:        {}",
        host.go_version().unwrap_or_else(|| "not found".red().to_string())
    );
    println!("  Host:      {}", host.label());
    println!("  CPU cores: {}", host.cpus);
}

/// Description and command line of each example.
pub const EXAMPLES: &[(&str, &str)] = &[
    ("Build the default platforms", "gox -s main.go"),
    (
        "Build specific platforms",
        "gox -s main.go -p windows/amd64,linux/amd64",
    ),
    ("Verbose output and compression", "gox -s main.go -v 2 -c"),
    ("Every platform, clean output first", "gox -s main.go -p all --clean"),
    ("One OS, native architecture", "gox -s main.go -p illumos"),
    ("One OS, every architecture", "gox -s main.go -p illumos --all"),
    (
        "Build on an Android device",
        "gox -s main.go -p android/arm64,android/arm",
    ),
    ("Force iOS on a non-macOS host", "gox -s main.go -p ios/arm64 --force"),
    ("Skip every prompt", "gox -s main.go -p mobile --no-prompt"),
    ("Quiet mode", "gox -s main.go -v 0"),
    ("Custom ldflags", "gox -s main.go --ldflags \"-s -w\""),
    ("Skip cgo platforms", "gox -s main.go -p all --skip-cgo"),
    ("Write a JSON report", "gox -s main.go --report build/report.json"),
];

pub fn show_examples() {
    println!("{} {}", "📚".cyan(), "Examples".bold());
    for (description, command) in EXAMPLES {
        println!("  • {}:", description.bold());
        println!("    {}", command.cyan());
        println!();
    }
}
