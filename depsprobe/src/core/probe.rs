//! Probe configuration set: ordered candidate roots for manifest entries.

use std::path::{Path, PathBuf};

use crate::core::entry::DepsEntry;
use crate::core::types::FxLevel;

/// Where a probe root comes from; decides layout and eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// Servicing root; only serviceable entries, package layout.
    Servicing,
    /// Caller-supplied extra probe directory, package layout.
    Lookup,
    /// Shared package store, package layout.
    SharedStore,
    /// Framework directory of the given level, published layout.
    Framework(FxLevel),
    /// Application directory, published layout.
    App,
}

/// One candidate root plus its existence-verification policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub root: PathBuf,
    pub kind: ProbeKind,
    /// Candidates must exist on disk; fixed when the set is built.
    pub verify_existence: bool,
}

impl ProbeConfig {
    pub fn servicing(root: PathBuf) -> Self {
        Self {
            root,
            kind: ProbeKind::Servicing,
            verify_existence: true,
        }
    }

    pub fn lookup(root: PathBuf) -> Self {
        Self {
            root,
            kind: ProbeKind::Lookup,
            verify_existence: true,
        }
    }

    pub fn shared_store(root: PathBuf) -> Self {
        Self {
            root,
            kind: ProbeKind::SharedStore,
            verify_existence: true,
        }
    }

    pub fn framework(root: PathBuf, level: FxLevel, verify_existence: bool) -> Self {
        Self {
            root,
            kind: ProbeKind::Framework(level),
            verify_existence,
        }
    }

    pub fn app(root: PathBuf, verify_existence: bool) -> Self {
        Self {
            root,
            kind: ProbeKind::App,
            verify_existence,
        }
    }

    /// Lookup and shared store roots, reported as probing directories.
    pub fn is_lookup(&self) -> bool {
        matches!(self.kind, ProbeKind::Lookup | ProbeKind::SharedStore)
    }

    /// Whether an entry declared at `level` may be satisfied from this root.
    ///
    /// Framework roots serve entries of their own level and of more
    /// application-ward frameworks, never application entries.
    pub fn accepts(&self, entry: &DepsEntry, level: FxLevel) -> bool {
        match self.kind {
            ProbeKind::Servicing => entry.library.serviceable,
            ProbeKind::Lookup | ProbeKind::SharedStore => true,
            ProbeKind::Framework(fx_level) => !level.is_app() && level <= fx_level,
            ProbeKind::App => level.is_app(),
        }
    }

    /// Candidate path of `entry` under this root.
    pub fn candidate(&self, entry: &DepsEntry) -> PathBuf {
        match self.kind {
            ProbeKind::Servicing | ProbeKind::Lookup | ProbeKind::SharedStore => {
                self.root.join(entry.package_path())
            }
            ProbeKind::Framework(_) | ProbeKind::App => self.root.join(entry.published_path()),
        }
    }
}

/// Inputs for [`build_probe_set`].
#[derive(Debug, Clone)]
pub struct ProbeSetInputs<'a> {
    pub servicing_root: Option<&'a Path>,
    pub probe_paths: &'a [PathBuf],
    /// Shared store roots already suffixed with `<arch>/<tfm>`.
    pub shared_stores: &'a [PathBuf],
    /// Framework directories, highest framework (level 1) first.
    pub framework_dirs: Vec<(FxLevel, &'a Path)>,
    pub app_dir: &'a Path,
    /// Verify existence under framework and application directories too.
    pub verify_chain_dirs: bool,
}

/// Build the ordered probe set.
///
/// Priority: servicing, extra probe paths, shared stores, frameworks from the
/// highest to the root, then the application directory. Chain directories are
/// trusted unless `verify_chain_dirs` is set.
pub fn build_probe_set(inputs: &ProbeSetInputs<'_>) -> Vec<ProbeConfig> {
    let mut probes = Vec::new();
    if let Some(servicing) = inputs.servicing_root {
        probes.push(ProbeConfig::servicing(servicing.join("pkgs")));
    }
    probes.extend(inputs.probe_paths.iter().cloned().map(ProbeConfig::lookup));
    probes.extend(inputs.shared_stores.iter().cloned().map(ProbeConfig::shared_store));
    for (level, dir) in &inputs.framework_dirs {
        probes.push(ProbeConfig::framework(
            dir.to_path_buf(),
            *level,
            inputs.verify_chain_dirs,
        ));
    }
    probes.push(ProbeConfig::app(
        inputs.app_dir.to_path_buf(),
        inputs.verify_chain_dirs,
    ));
    probes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::Library;
    use crate::core::types::AssetKind;

    fn entry(serviceable: bool) -> DepsEntry {
        let library = Library {
            serviceable,
            ..Library::from_key("Foo/1.0.0")
        };
        DepsEntry::new(library, AssetKind::Runtime, "lib/net8.0/Foo.dll")
    }

    #[test]
    fn probe_set_orders_roots_and_marks_verification() {
        let probe_paths = vec![PathBuf::from("probe")];
        let stores = vec![PathBuf::from("store").join("x64").join("net8.0")];
        let inputs = ProbeSetInputs {
            servicing_root: Some(Path::new("svc")),
            probe_paths: &probe_paths,
            shared_stores: &stores,
            framework_dirs: vec![
                (FxLevel::new(1), Path::new("fx1")),
                (FxLevel::new(2), Path::new("fx2")),
            ],
            app_dir: Path::new("app"),
            verify_chain_dirs: false,
        };

        let probes = build_probe_set(&inputs);
        let kinds: Vec<ProbeKind> = probes.iter().map(|probe| probe.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ProbeKind::Servicing,
                ProbeKind::Lookup,
                ProbeKind::SharedStore,
                ProbeKind::Framework(FxLevel::new(1)),
                ProbeKind::Framework(FxLevel::new(2)),
                ProbeKind::App,
            ]
        );
        let verified: Vec<bool> = probes.iter().map(|probe| probe.verify_existence).collect();
        assert_eq!(verified, vec![true, true, true, false, false, false]);
        assert_eq!(probes[0].root, Path::new("svc").join("pkgs"));
    }

    #[test]
    fn verify_chain_dirs_applies_to_frameworks_and_app() {
        let inputs = ProbeSetInputs {
            servicing_root: None,
            probe_paths: &[],
            shared_stores: &[],
            framework_dirs: vec![(FxLevel::new(1), Path::new("fx"))],
            app_dir: Path::new("app"),
            verify_chain_dirs: true,
        };
        let probes = build_probe_set(&inputs);
        assert!(probes.iter().all(|probe| probe.verify_existence));
    }

    #[test]
    fn eligibility_follows_levels() {
        let plain = entry(false);
        let fx2 = ProbeConfig::framework(PathBuf::from("fx2"), FxLevel::new(2), false);
        assert!(!fx2.accepts(&plain, FxLevel::APP));
        assert!(fx2.accepts(&plain, FxLevel::new(1)));
        assert!(fx2.accepts(&plain, FxLevel::new(2)));
        assert!(!fx2.accepts(&plain, FxLevel::new(3)));

        let app = ProbeConfig::app(PathBuf::from("app"), false);
        assert!(app.accepts(&plain, FxLevel::APP));
        assert!(!app.accepts(&plain, FxLevel::new(1)));

        let svc = ProbeConfig::servicing(PathBuf::from("svc"));
        assert!(!svc.accepts(&plain, FxLevel::APP));
        assert!(svc.accepts(&entry(true), FxLevel::APP));
    }

    #[test]
    fn candidates_use_layout_of_probe_kind() {
        let entry = entry(false);
        let app = ProbeConfig::app(PathBuf::from("app"), false);
        assert_eq!(app.candidate(&entry), Path::new("app").join("Foo.dll"));

        let lookup = ProbeConfig::lookup(PathBuf::from("probe"));
        assert_eq!(
            lookup.candidate(&entry),
            Path::new("probe").join(entry.package_path())
        );
    }
}
