//! `--clean`: remove the previous output tree before building.

use crate::error::{BuildError, Result};
use crate::ui::Console;
use std::fs;
use std::path::Path;

/// Returns whether anything was removed.
pub fn clean_output_dir(output_root: &Path, console: &Console) -> Result<bool> {
    if !output_root.exists() {
        return Ok(false);
    }
    console.info(format!("Cleaning output directory {}", output_root.display()));
    fs::remove_dir_all(output_root).map_err(|source| BuildError::Clean {
        path: output_root.to_path_buf(),
        source,
    })?;
    Ok(true)
}
