//! Expansion of the serialized additional-manifest list.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::types::split_path_list;
use crate::core::version::{FxVersion, best_patch_match};
use crate::io::scan::{files_with_suffix, version_dirs};

const DEPS_SUFFIX: &str = ".deps.json";

/// Root framework of a framework-dependent app, used to pick the
/// `shared/<name>/<version>` sub-directory of additional-deps directories.
#[derive(Debug, Clone, Copy)]
pub struct RootFramework<'a> {
    pub name: &'a str,
    pub version: &'a str,
}

/// Manifest paths named by `serialized`, in order.
///
/// Items ending in `.deps.json` are taken when the file exists; any other item
/// is a directory whose `*.deps.json` files are taken in name order.
pub fn additional_deps_paths(serialized: &str, root: Option<RootFramework<'_>>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for item in split_path_list(serialized) {
        let item_path = Path::new(item);
        if item.to_ascii_lowercase().ends_with(DEPS_SUFFIX) {
            if item_path.is_file() {
                paths.push(item_path.to_path_buf());
            } else {
                warn!(path = %item_path.display(), "additional manifest not found");
            }
            continue;
        }

        let Some(dir) = manifest_dir(item_path, root) else {
            continue;
        };
        match files_with_suffix(&dir, DEPS_SUFFIX) {
            Ok(found) => {
                debug!(dir = %dir.display(), count = found.len(), "additional manifests found");
                paths.extend(found);
            }
            Err(err) => warn!(dir = %dir.display(), error = %format!("{err:#}"), "cannot list additional manifests"),
        }
    }
    paths
}

/// Directory holding the manifests for an additional-deps directory item.
fn manifest_dir(item: &Path, root: Option<RootFramework<'_>>) -> Option<PathBuf> {
    let Some(root) = root else {
        return Some(item.to_path_buf());
    };
    let fx_dir = item.join("shared").join(root.name);
    let target = match root.version.parse::<FxVersion>() {
        Ok(version) => version,
        Err(err) => {
            warn!(version = root.version, error = %err, "root framework version unusable for additional deps");
            return None;
        }
    };
    let available = match version_dirs(&fx_dir) {
        Ok(available) => available,
        Err(err) => {
            warn!(dir = %fx_dir.display(), error = %format!("{err:#}"), "cannot list additional deps versions");
            return None;
        }
    };
    match best_patch_match(&available, &target) {
        Some(best) => Some(fx_dir.join(best.to_string())),
        None => {
            debug!(dir = %fx_dir.display(), version = %target, "no additional deps for framework version");
            None
        }
    }
}
