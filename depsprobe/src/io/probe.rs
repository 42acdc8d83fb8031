//! Entry probing against the probe configuration set.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::core::entry::DepsEntry;
use crate::core::probe::{ProbeConfig, ProbeKind};
use crate::core::types::FxLevel;
use crate::io::bundle::{BundleInfo, BundleLocation};

/// Where an entry was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    pub path: PathBuf,
    /// Served from the single-file bundle; no file exists at `path`.
    pub found_in_bundle: bool,
}

/// Find `entry` (declared at `level`) in the first eligible probe that has it.
///
/// Probes that verify existence canonicalize the candidate, resolving
/// symbolic links; trusted probes accept the joined path as-is. Returns `None`
/// when nothing matched.
pub fn probe_entry(
    entry: &DepsEntry,
    level: FxLevel,
    probes: &[ProbeConfig],
    bundle: &dyn BundleInfo,
) -> Option<ProbeHit> {
    for probe in probes {
        if !probe.accepts(entry, level) {
            continue;
        }

        if probe.kind == ProbeKind::App && bundle.is_single_file_bundle() {
            let relative = entry.published_path();
            match bundle.locate(&relative) {
                BundleLocation::InBundle => {
                    trace!(asset = %entry.relative_path, "found in bundle");
                    return Some(ProbeHit {
                        path: probe.root.join(relative),
                        found_in_bundle: true,
                    });
                }
                BundleLocation::Extracted(path) => {
                    trace!(asset = %entry.relative_path, path = %path.display(), "found extracted from bundle");
                    return Some(ProbeHit {
                        path,
                        found_in_bundle: false,
                    });
                }
                BundleLocation::NotInBundle => {}
            }
        }

        let candidate = probe.candidate(entry);
        if !probe.verify_existence {
            trace!(asset = %entry.relative_path, path = %candidate.display(), "accepted from trusted probe");
            return Some(ProbeHit {
                path: candidate,
                found_in_bundle: false,
            });
        }
        match fs::canonicalize(&candidate) {
            Ok(path) if path.is_file() => {
                trace!(asset = %entry.relative_path, path = %path.display(), "found on disk");
                return Some(ProbeHit {
                    path,
                    found_in_bundle: false,
                });
            }
            _ => trace!(path = %candidate.display(), "candidate missing"),
        }
    }
    debug!(
        library = %entry.library.name,
        version = %entry.library.version,
        asset = %entry.relative_path,
        rid = entry.rid.as_deref().unwrap_or("any"),
        "no probe matched"
    );
    None
}
