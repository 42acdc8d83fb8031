//! Probe-path resolution over a validated framework chain.
//!
//! Manifests are walked application first, then each framework toward the
//! root, then additional manifests. The first occurrence of an asset name wins;
//! later levels only fill gaps.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::chain::FrameworkChain;
use crate::core::entry::DepsEntry;
use crate::core::types::{
    AssetKind, Breadcrumb, ENGINE_LIBRARY, FxLevel, HostMode, MissingAssets, ProbePaths,
    ResolutionOutput, ResolvedAsset, join_path_list,
};
use crate::error::{ResolveError, Result};
use crate::io::bundle::BundleLocation;
use crate::io::deps_json::Manifest;
use crate::io::probe::{ProbeHit, probe_entry};
use crate::io::scan::files_with_suffix;
use crate::validate::ValidatedChain;

/// Native assets renamed at publish time; never fatal when missing.
const APPHOST_ASSET: &str = "apphost";

/// Resolves the trusted assembly list and probe directories for one chain.
pub struct DepsResolver<'c, 'a> {
    chain: &'c FrameworkChain<'a>,
}

/// A manifest in walk order.
#[derive(Clone, Copy)]
struct Source<'c> {
    level: FxLevel,
    manifest: &'c Manifest,
    /// The application level whose manifest file does not exist.
    app_without_manifest: bool,
}

#[derive(Default)]
struct ProbeDirs {
    dirs: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
    engine: Option<PathBuf>,
}

impl ProbeDirs {
    fn add(&mut self, dir: &Path) {
        if self.seen.insert(dir.to_path_buf()) {
            self.dirs.push(dir.to_path_buf());
        }
    }
}

impl<'c, 'a> DepsResolver<'c, 'a> {
    pub fn new(validated: ValidatedChain<'c, 'a>) -> Self {
        Self {
            chain: validated.chain(),
        }
    }

    /// Resolve the trusted assembly list, native and resource directories and
    /// the engine library path. Identical inputs give identical output.
    pub fn resolve_probe_paths(&self, missing: MissingAssets) -> Result<ResolutionOutput> {
        let mut breadcrumbs = BTreeSet::new();
        let tpa = self.resolve_tpa_list(missing, &mut breadcrumbs)?;
        let natives = self.resolve_probe_dirs(AssetKind::Native, missing, &mut breadcrumbs)?;
        let resources = self.resolve_probe_dirs(AssetKind::Resources, missing, &mut breadcrumbs)?;

        let coreclr = natives
            .engine
            .clone()
            .or_else(|| self.fallback_engine_path())
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        if coreclr.is_empty() {
            warn!(engine = ENGINE_LIBRARY, "engine library not found");
        }
        debug!(
            tpa = tpa.len(),
            native_dirs = natives.dirs.len(),
            resource_dirs = resources.dirs.len(),
            breadcrumbs = breadcrumbs.len(),
            "probe paths resolved"
        );

        Ok(ResolutionOutput {
            probe_paths: ProbePaths {
                tpa: join_path_list(tpa.iter().map(|asset| &asset.path)),
                native: join_path_list(&natives.dirs),
                resources: join_path_list(&resources.dirs),
                coreclr,
            },
            breadcrumbs,
        })
    }

    /// Lookup and shared store roots, joined with the path-list separator.
    pub fn lookup_probe_directories(&self) -> String {
        join_path_list(
            self.chain
                .probe_configs()
                .iter()
                .filter(|probe| probe.is_lookup())
                .map(|probe| &probe.root),
        )
    }

    /// Manifests the runtime should expose to the application, application first.
    pub fn app_context_deps_files(&self) -> Vec<PathBuf> {
        let bundle = self.chain.bundle();
        let mut files = Vec::new();
        for (level, manifest) in self.chain.levels() {
            if !manifest.exists() {
                continue;
            }
            if level.is_app() && bundle.is_single_file_bundle() {
                let bundled = manifest
                    .path()
                    .file_name()
                    .map(|name| bundle.locate(Path::new(name)) == BundleLocation::InBundle)
                    .unwrap_or(false);
                if bundled {
                    continue;
                }
            }
            files.push(manifest.path().to_path_buf());
        }
        files.extend(
            self.chain
                .additional_manifests()
                .iter()
                .map(|manifest| manifest.path().to_path_buf()),
        );
        files
    }

    pub fn app_dir(&self) -> String {
        self.chain.app_dir()
    }

    pub fn root_manifest(&self) -> &'c Manifest {
        self.chain.root_manifest()
    }

    pub fn is_framework_dependent(&self) -> bool {
        self.chain.is_framework_dependent()
    }

    fn sources(&self) -> Vec<Source<'c>> {
        let chain = self.chain;
        let mut sources: Vec<Source<'c>> = chain
            .levels()
            .map(|(level, manifest)| Source {
                level,
                manifest,
                app_without_manifest: level.is_app() && !manifest.exists(),
            })
            .collect();
        sources.extend(chain.additional_manifests().iter().map(|manifest| Source {
            level: FxLevel::APP,
            manifest,
            app_without_manifest: false,
        }));
        sources
    }

    fn resolve_tpa_list(
        &self,
        missing: MissingAssets,
        breadcrumbs: &mut BTreeSet<Breadcrumb>,
    ) -> Result<Vec<ResolvedAsset>> {
        let names = self.chain.names();
        let args = self.chain.args();
        let mut seen = HashSet::new();
        let mut assets = Vec::new();

        if args.host_mode != HostMode::Libhost {
            if let Some(stem) = args.managed_application.file_stem() {
                let name = stem.to_string_lossy().into_owned();
                seen.insert(names.key(&name));
                assets.push(ResolvedAsset {
                    name,
                    path: args.managed_application.clone(),
                    found_in_bundle: false,
                });
            }
        }

        for source in self.sources() {
            for entry in source.manifest.entries_of(AssetKind::Runtime) {
                if entry.is_placeholder() {
                    trace!(library = %entry.library.name, asset = %entry.relative_path, "skipping placeholder");
                    continue;
                }
                if !seen.insert(names.key(&entry.name)) {
                    trace!(name = %entry.name, level = %source.level, "shadowed by earlier level");
                    continue;
                }
                if let Some(hit) = self.probe(entry, source, missing)? {
                    breadcrumbs.insert(entry.breadcrumb());
                    assets.push(ResolvedAsset {
                        name: entry.name.clone(),
                        path: hit.path,
                        found_in_bundle: hit.found_in_bundle,
                    });
                }
            }

            if source.app_without_manifest {
                for path in self.app_local_assemblies() {
                    let Some(stem) = path.file_stem() else {
                        continue;
                    };
                    let name = stem.to_string_lossy().into_owned();
                    if seen.insert(names.key(&name)) {
                        assets.push(ResolvedAsset {
                            name,
                            path,
                            found_in_bundle: false,
                        });
                    }
                }
            }
        }
        Ok(assets)
    }

    fn resolve_probe_dirs(
        &self,
        kind: AssetKind,
        missing: MissingAssets,
        breadcrumbs: &mut BTreeSet<Breadcrumb>,
    ) -> Result<ProbeDirs> {
        let names = self.chain.names();
        let mut seen = HashSet::new();
        let mut dirs = ProbeDirs::default();

        for source in self.sources() {
            for entry in source.manifest.entries_of(kind) {
                if entry.is_placeholder() {
                    trace!(library = %entry.library.name, asset = %entry.relative_path, "skipping placeholder");
                    continue;
                }
                if !seen.insert(names.key(&entry.dedupe_name())) {
                    trace!(name = %entry.dedupe_name(), level = %source.level, "shadowed by earlier level");
                    continue;
                }
                let Some(hit) = self.probe(entry, source, missing)? else {
                    continue;
                };
                breadcrumbs.insert(entry.breadcrumb());
                if kind == AssetKind::Native
                    && dirs.engine.is_none()
                    && entry.file_name() == ENGINE_LIBRARY
                {
                    dirs.engine = Some(hit.path.clone());
                }
                if hit.found_in_bundle {
                    continue;
                }
                let dir = match kind {
                    AssetKind::Resources => hit.path.parent().and_then(Path::parent),
                    AssetKind::Runtime | AssetKind::Native => hit.path.parent(),
                };
                if let Some(dir) = dir {
                    dirs.add(dir);
                }
            }

            if source.app_without_manifest {
                dirs.add(&self.chain.args().app_root);
            }
        }
        Ok(dirs)
    }

    /// Probe one entry, applying the missing-asset policy to a miss.
    fn probe(
        &self,
        entry: &DepsEntry,
        source: Source<'c>,
        missing: MissingAssets,
    ) -> Result<Option<ProbeHit>> {
        let chain = self.chain;
        if let Some(hit) = probe_entry(entry, source.level, chain.probe_configs(), chain.bundle()) {
            return Ok(Some(hit));
        }
        if entry.kind == AssetKind::Native && entry.name == APPHOST_ASSET {
            debug!(asset = %entry.relative_path, "apphost asset missing; ignored");
            return Ok(None);
        }
        match missing {
            MissingAssets::Fail => Err(ResolveError::UnresolvedAsset {
                manifest: source.manifest.path().to_path_buf(),
                library: entry.library.name.clone(),
                version: entry.library.version.clone(),
                asset: entry.relative_path.clone(),
            }),
            MissingAssets::Ignore => {
                warn!(
                    manifest = %source.manifest.path().display(),
                    library = %entry.library.name,
                    version = %entry.library.version,
                    asset = %entry.relative_path,
                    "asset not found; skipped"
                );
                Ok(None)
            }
        }
    }

    fn app_local_assemblies(&self) -> Vec<PathBuf> {
        let app_root = &self.chain.args().app_root;
        match files_with_suffix(app_root, ".dll") {
            Ok(files) => files,
            Err(err) => {
                warn!(dir = %app_root.display(), error = %format!("{err:#}"), "cannot list application assemblies");
                Vec::new()
            }
        }
    }

    /// `<root dir>/<engine library>` when that file exists.
    fn fallback_engine_path(&self) -> Option<PathBuf> {
        let definitions = self.chain.definitions();
        let dir = if self.chain.is_framework_dependent() && definitions.has_frameworks() {
            &definitions.root().dir
        } else {
            &self.chain.args().app_root
        };
        let candidate = dir.join(ENGINE_LIBRARY);
        candidate.is_file().then_some(candidate)
    }
}
