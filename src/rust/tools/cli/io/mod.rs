#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Write `bytes` to `path`, creating parent directories as needed
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
