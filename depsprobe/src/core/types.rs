//! Shared deterministic types for resolver core logic.
//!
//! These types define stable contracts between the chain builder, the probe
//! configuration set and the resolver. They do not depend on external state and
//! serialize deterministically.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between items of a joined path list (`PATH`-style).
pub const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// File name of the execution engine library on this platform.
pub const ENGINE_LIBRARY: &str = if cfg!(windows) {
    "coreclr.dll"
} else if cfg!(target_os = "macos") {
    "libcoreclr.dylib"
} else {
    "libcoreclr.so"
};

/// Asset kinds a dependency manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Managed assembly, loaded through the trusted assembly list.
    Runtime,
    /// Native library, loaded from a native probe directory.
    Native,
    /// Satellite resource assembly under a culture directory.
    Resources,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Runtime => "runtime",
            AssetKind::Native => "native",
            AssetKind::Resources => "resources",
        }
    }

    /// Parse the `assetType` spelling used by manifests.
    pub fn from_manifest(value: &str) -> Option<Self> {
        match value {
            "runtime" => Some(AssetKind::Runtime),
            "native" => Some(AssetKind::Native),
            "resources" => Some(AssetKind::Resources),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode the host process runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMode {
    /// Standalone muxer (`dotnet app.dll`).
    Muxer,
    /// Application executable, possibly a single-file bundle.
    Apphost,
    /// Runtime hosted inside another process; no application directory.
    Libhost,
}

impl FromStr for HostMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "muxer" => Ok(HostMode::Muxer),
            "apphost" => Ok(HostMode::Apphost),
            "libhost" => Ok(HostMode::Libhost),
            other => Err(format!(
                "unknown host mode '{other}' (expected muxer, apphost or libhost)"
            )),
        }
    }
}

/// Position of a manifest in the framework chain.
///
/// Level 0 is the application; higher levels move toward the root framework.
/// Only the chain hands out levels, so a level always names an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FxLevel(usize);

impl FxLevel {
    pub const APP: FxLevel = FxLevel(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn is_app(self) -> bool {
        self.0 == 0
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FxLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_app() {
            f.write_str("app")
        } else {
            write!(f, "fx[{}]", self.0)
        }
    }
}

/// What to do with a declared asset that no probe configuration can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingAssets {
    /// Resolution fails naming the asset.
    #[default]
    Fail,
    /// The asset is left out of the output and the breadcrumbs.
    Ignore,
}

/// A manifest entry paired with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Logical asset name the entry was deduplicated under.
    pub name: String,
    pub path: PathBuf,
    /// The asset lives in the single-file bundle rather than on disk.
    pub found_in_bundle: bool,
}

/// Identity of a resolved asset, recorded for servicing bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub library: String,
    pub version: String,
    pub asset: String,
}

/// The four joined path lists handed to the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePaths {
    pub tpa: String,
    pub native: String,
    pub resources: String,
    pub coreclr: String,
}

/// Result of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutput {
    #[serde(flatten)]
    pub probe_paths: ProbePaths,
    pub breadcrumbs: BTreeSet<Breadcrumb>,
}

/// Join paths with [`PATH_LIST_SEPARATOR`], without a trailing separator.
pub fn join_path_list<I, P>(items: I) -> String
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut joined = String::new();
    for item in items {
        if !joined.is_empty() {
            joined.push(PATH_LIST_SEPARATOR);
        }
        joined.push_str(&item.as_ref().to_string_lossy());
    }
    joined
}

/// Split a joined path list, dropping empty items.
pub fn split_path_list(joined: &str) -> Vec<&str> {
    joined
        .split(PATH_LIST_SEPARATOR)
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_path_list_has_no_trailing_separator() {
        let joined = join_path_list(["a", "b", "c"]);
        assert_eq!(
            joined,
            format!("a{PATH_LIST_SEPARATOR}b{PATH_LIST_SEPARATOR}c")
        );
        assert_eq!(split_path_list(&joined), vec!["a", "b", "c"]);
    }

    #[test]
    fn join_path_list_of_nothing_is_empty() {
        assert_eq!(join_path_list(Vec::<PathBuf>::new()), "");
        assert!(split_path_list("").is_empty());
    }

    #[test]
    fn host_mode_parses_known_spellings() {
        assert_eq!("libhost".parse::<HostMode>(), Ok(HostMode::Libhost));
        assert!("split".parse::<HostMode>().is_err());
    }

    #[test]
    fn fx_level_display_names_app() {
        assert_eq!(FxLevel::APP.to_string(), "app");
        assert_eq!(FxLevel::new(2).to_string(), "fx[2]");
    }
}
