//! `gox list` and `gox groups`.

use crate::platform::{Catalog, CatalogSource, groups::PLATFORM_GROUPS};
use crate::ui::Table;
use colored::*;

/// How many entries of the dynamic `all` group `gox groups` shows.
const ALL_PREVIEW: usize = 10;

pub fn list_platforms(catalog: &Catalog) {
    println!("{} {}", "📋".cyan(), "Supported platforms".bold());
    if let CatalogSource::Fallback(reason) = catalog.source() {
        println!(
            "{} Platform discovery failed ({}), showing the built-in list",
            "!".yellow(),
            reason
        );
    }

    let mut table = Table::new(&["OS", "Architectures"]);
    for (os, archs) in catalog.by_os() {
        table.add_row(vec![os.bold().to_string(), archs.join(", ")]);
    }
    table.print();
    println!(
        "   {} platforms across {} operating systems",
        catalog.entries().len(),
        catalog.by_os().len()
    );
}

pub fn list_groups(catalog: &Catalog) {
    println!("{} {}", "📦".blue(), "Platform groups".bold());

    let mut table = Table::new(&["Group", "Description", "Platforms"]);
    for (name, description, labels) in PLATFORM_GROUPS {
        table.add_row(vec![
            name.green().bold().to_string(),
            description.to_string(),
            labels.join(", "),
        ]);
    }
    table.print();

    println!();
    println!("  {} (discovered from 'go tool dist list'):", "all".green().bold());
    match catalog.source() {
        CatalogSource::Discovered => {
            let entries = catalog.entries();
            println!("    {} platforms", entries.len());
            for t in entries.iter().take(ALL_PREVIEW) {
                println!("    • {}", t.label());
            }
            if entries.len() > ALL_PREVIEW {
                println!("    • ... {} more", entries.len() - ALL_PREVIEW);
            }
        }
        CatalogSource::Fallback(reason) => {
            println!("    {} discovery failed: {}", "x".red(), reason);
            println!("    {} the built-in list will be used", "💡".yellow());
        }
    }
}
