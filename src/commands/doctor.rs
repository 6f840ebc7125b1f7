//! `gox doctor`: check the toolchain and host before a long build.

use crate::build::policy::HELPER_TOOL;
use crate::host::{self, Host};
use crate::platform::{Catalog, CatalogSource};
use anyhow::Result;
use colored::*;

pub fn run_doctor(host: &Host, catalog: &Catalog) -> Result<()> {
    println!("{} Running doctor...", "🚑".red());
    println!("-------------------------------");

    println!("Checking host... {} ({} cores)", host.label().green(), host.cpus);

    print!("Checking Go... ");
    match host.go_version() {
        Some(version) => println!("{}", version.green()),
        None => println!("{}", "Not Found (install Go and add it to PATH)".red()),
    }

    print!("Checking platform discovery... ");
    match catalog.source() {
        CatalogSource::Discovered => {
            println!("{} ({} platforms)", "OK".green(), catalog.entries().len())
        }
        CatalogSource::Fallback(reason) => {
            println!("{} ({reason}), built-in list will be used", "Failed".yellow())
        }
    }

    print!("Checking {HELPER_TOOL}... ");
    if host.os != "darwin" {
        println!("{}", "Skipped (iOS builds need a macOS host)".dimmed());
    } else if host::tool_available(HELPER_TOOL, "-version") {
        println!("{}", "Found".green());
    } else {
        println!("{}", "Not Found (needed for iOS targets)".yellow());
    }

    print!("Checking gomobile... ");
    if host::tool_available("gomobile", "version") {
        println!("{}", "Found".green());
    } else {
        println!("{}", "Not Found (Optional, recommended for Android/iOS)".yellow());
    }

    if let Some(goenv) = host.goenv_override() {
        println!("Android GOENV... {}", goenv.display().to_string().green());
    }

    Ok(())
}
