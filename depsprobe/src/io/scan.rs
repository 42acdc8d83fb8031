//! Directory listings used to discover manifests and app-local assemblies.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::version::FxVersion;

/// Files in `dir` whose name ends with `suffix` (ASCII case-insensitive),
/// sorted by file name. A missing directory yields an empty list.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let suffix = suffix.to_ascii_lowercase();
    let mut files = Vec::new();
    for item in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let item = item.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = item.path();
        let matches = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(&suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Sub-directories of `dir` whose names parse as versions.
pub fn version_dirs(dir: &Path) -> Result<Vec<FxVersion>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut versions = Vec::new();
    for item in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let item = item.with_context(|| format!("read entry in {}", dir.display()))?;
        if !item.path().is_dir() {
            continue;
        }
        if let Ok(version) = item.file_name().to_string_lossy().parse::<FxVersion>() {
            versions.push(version);
        }
    }
    versions.sort();
    Ok(versions)
}
