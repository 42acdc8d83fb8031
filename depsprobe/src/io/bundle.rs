//! Single-file bundle adapter.
//!
//! Bundle extraction itself belongs to the host; the resolver only asks where
//! a file lives.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Where a published file lives relative to a single-file bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleLocation {
    NotInBundle,
    /// Served from the bundle's virtual storage.
    InBundle,
    /// Extracted to disk at the given path.
    Extracted(PathBuf),
}

/// Questions the resolver asks about the current process image.
pub trait BundleInfo {
    fn is_single_file_bundle(&self) -> bool;

    /// Backward-compatibility mode: every bundled file is extracted to disk.
    fn is_compat_mode(&self) -> bool;

    fn extraction_dir(&self) -> Option<&Path>;

    /// Look up a path relative to the application directory.
    fn locate(&self, relative_path: &Path) -> BundleLocation;

    /// Extraction directory, when it replaces the application directory.
    fn compat_extraction_dir(&self) -> Option<&Path> {
        if self.is_single_file_bundle() && self.is_compat_mode() {
            self.extraction_dir()
        } else {
            None
        }
    }
}

/// The process is not a single-file bundle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBundle;

impl BundleInfo for NoBundle {
    fn is_single_file_bundle(&self) -> bool {
        false
    }

    fn is_compat_mode(&self) -> bool {
        false
    }

    fn extraction_dir(&self) -> Option<&Path> {
        None
    }

    fn locate(&self, _relative_path: &Path) -> BundleLocation {
        BundleLocation::NotInBundle
    }
}

/// A bundle described by the list of files it carries.
#[derive(Debug, Clone, Default)]
pub struct StaticBundle {
    files: BTreeSet<PathBuf>,
    extraction_dir: Option<PathBuf>,
    compat_mode: bool,
}

impl StaticBundle {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            extraction_dir: None,
            compat_mode: false,
        }
    }

    /// Switch to backward-compatibility mode, extracting into `dir`.
    pub fn extracted_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extraction_dir = Some(dir.into());
        self.compat_mode = true;
        self
    }
}

impl BundleInfo for StaticBundle {
    fn is_single_file_bundle(&self) -> bool {
        true
    }

    fn is_compat_mode(&self) -> bool {
        self.compat_mode
    }

    fn extraction_dir(&self) -> Option<&Path> {
        self.extraction_dir.as_deref()
    }

    fn locate(&self, relative_path: &Path) -> BundleLocation {
        if !self.files.contains(relative_path) {
            return BundleLocation::NotInBundle;
        }
        match (&self.extraction_dir, self.compat_mode) {
            (Some(dir), true) => BundleLocation::Extracted(dir.join(relative_path)),
            _ => BundleLocation::InBundle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bundle_never_locates() {
        assert_eq!(NoBundle.locate(Path::new("App.dll")), BundleLocation::NotInBundle);
        assert_eq!(NoBundle.compat_extraction_dir(), None);
    }

    #[test]
    fn static_bundle_serves_listed_files() {
        let bundle = StaticBundle::new(["App.dll"]);
        assert_eq!(bundle.locate(Path::new("App.dll")), BundleLocation::InBundle);
        assert_eq!(bundle.locate(Path::new("Other.dll")), BundleLocation::NotInBundle);
        assert_eq!(bundle.compat_extraction_dir(), None);
    }

    #[test]
    fn compat_bundle_reports_extracted_paths() {
        let bundle = StaticBundle::new(["App.dll"]).extracted_to("/tmp/extract");
        assert_eq!(
            bundle.locate(Path::new("App.dll")),
            BundleLocation::Extracted(Path::new("/tmp/extract").join("App.dll"))
        );
        assert_eq!(bundle.compat_extraction_dir(), Some(Path::new("/tmp/extract")));
    }
}
