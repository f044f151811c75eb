//! Output path derivation and atomic file writes.

use anyhow::{anyhow, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension stripped from description file names.
pub const DESCRIPTION_EXT: &str = "txt";

/// Extension of generated constant files.
pub const CONST_EXT: &str = "const";

/// Derive the constant file path for a description and architecture.
///
/// `sys/linux/fs.txt` + `amd64` becomes `sys/linux/fs_amd64.const`. Inputs
/// without a `.txt` extension keep their full file name as the stem.
pub fn const_file_path(input: &Path, arch: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(&format!(".{}", DESCRIPTION_EXT))
        .unwrap_or(&file_name);
    input.with_file_name(format!("{}_{}.{}", stem, arch, CONST_EXT))
}

/// Ensure all parent directories exist for a path.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    Ok(())
}

/// Write a file atomically: write a temp file in the target directory, then
/// rename it over `path`. The temp file is removed on every failure path.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| anyhow!("Failed to create temp file in {}: {}", dir.display(), e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| anyhow!("Failed to write temp file {}: {}", tmp.path().display(), e))?;
    tmp.persist(path).map_err(|e| {
        anyhow!(
            "Failed to rename {} to {}: {}",
            e.file.path().display(),
            path.display(),
            e.error
        )
    })?;
    Ok(())
}
