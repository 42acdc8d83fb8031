//! Manifest entries and the two on-disk layouts they are probed in.

use std::path::PathBuf;

use crate::core::types::{AssetKind, Breadcrumb};

/// File name NuGet uses to mark an empty asset folder.
const PLACEHOLDER_FILE: &str = "_._";

/// The library an entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub version: String,
    /// Package-store relative directory (`path` in the manifest), if declared.
    pub path: Option<String>,
    pub serviceable: bool,
}

impl Library {
    /// Split a `Name/Version` library key.
    pub fn from_key(key: &str) -> Self {
        let (name, version) = key.split_once('/').unwrap_or((key, ""));
        Self {
            name: name.to_string(),
            version: version.to_string(),
            path: None,
            serviceable: false,
        }
    }

    /// Directory of the library inside a package store.
    pub fn package_dir(&self) -> PathBuf {
        match &self.path {
            Some(path) => relative_path(path),
            None => PathBuf::from(self.name.to_lowercase()).join(self.version.to_lowercase()),
        }
    }
}

/// One asset declared by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsEntry {
    pub library: Library,
    pub kind: AssetKind,
    /// File name without its last extension (`Foo.resources` for
    /// `de/Foo.resources.dll`).
    pub name: String,
    /// Path as declared, `/`-separated, relative to the package root.
    pub relative_path: String,
    /// Runtime identifier for RID-specific assets.
    pub rid: Option<String>,
    /// Culture directory for resource assets.
    pub culture: Option<String>,
}

impl DepsEntry {
    pub fn new(library: Library, kind: AssetKind, relative_path: &str) -> Self {
        let file_name = file_name(relative_path);
        let name = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => file_name.to_string(),
        };
        let culture = match kind {
            AssetKind::Resources => parent_dir_name(relative_path).map(str::to_string),
            AssetKind::Runtime | AssetKind::Native => None,
        };
        Self {
            library,
            kind,
            name,
            relative_path: relative_path.to_string(),
            rid: None,
            culture,
        }
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.relative_path)
    }

    /// `_._` marks a package folder with nothing to deploy; there is no file to probe.
    pub fn is_placeholder(&self) -> bool {
        self.file_name() == PLACEHOLDER_FILE
    }

    /// Path of the asset inside a published (flat) directory.
    pub fn published_path(&self) -> PathBuf {
        match (self.kind, &self.culture) {
            (AssetKind::Resources, Some(culture)) => {
                PathBuf::from(culture).join(self.file_name())
            }
            _ => PathBuf::from(self.file_name()),
        }
    }

    /// Path of the asset inside a package store.
    pub fn package_path(&self) -> PathBuf {
        self.library
            .package_dir()
            .join(relative_path(&self.relative_path))
    }

    /// Name used to decide whether two entries are the same asset.
    ///
    /// Resources keep their culture so that every culture of an assembly
    /// survives deduplication.
    pub fn dedupe_name(&self) -> String {
        match (self.kind, &self.culture) {
            (AssetKind::Resources, Some(culture)) => format!("{culture}/{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn breadcrumb(&self) -> Breadcrumb {
        Breadcrumb {
            library: self.library.name.clone(),
            version: self.library.version.clone(),
            asset: self.relative_path.clone(),
        }
    }
}

fn file_name(relative_path: &str) -> &str {
    relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative_path)
}

fn parent_dir_name(relative_path: &str) -> Option<&str> {
    let mut segments = relative_path.rsplit(['/', '\\']);
    segments.next()?;
    segments.next().filter(|segment| !segment.is_empty())
}

/// Convert a `/`-separated manifest path into a platform path.
fn relative_path(manifest_path: &str) -> PathBuf {
    manifest_path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect()
}
