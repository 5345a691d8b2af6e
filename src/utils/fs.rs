//! File system helpers with atomic writes and best-effort removal.
//!
//! Everything that crosses the process boundary (settings, the handoff plan,
//! markers) is written with [`atomic_write`] so a crash mid-write leaves either
//! the old content or the new content, never a torn file.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Create a directory and all of its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        anyhow::bail!("Path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Writes content to a sibling `.tmp` file
/// 2. Syncs it to disk
/// 3. Renames it over the target path
///
/// Parent directories are created when missing.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename temp file to: {}", path.display())
    })?;

    Ok(())
}

/// Remove a file, treating "already gone" as success.
///
/// Returns `true` when a file was actually deleted.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove a file and log instead of failing.
///
/// Used for advisory cleanup where a leftover file is harmless and will be
/// swept on a later start.
pub fn remove_file_best_effort(path: &Path) -> bool {
    match remove_file_if_exists(path) {
        Ok(removed) => {
            if removed {
                debug!("Removed {}", path.display());
            }
            removed
        }
        Err(e) => {
            warn!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}
