//! Framework chain: one manifest per framework level, additional manifests and
//! the probe configuration set, built once from the launch arguments.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::app_dir::effective_app_dir;
use crate::core::names::NameComparison;
use crate::core::probe::{ProbeConfig, ProbeSetInputs, build_probe_set};
use crate::core::rid::RidFallbackGraph;
use crate::core::types::{FxLevel, HostMode};
use crate::core::version::short_tfm;
use crate::error::Result;
use crate::io::additional_deps::{RootFramework, additional_deps_paths};
use crate::io::bundle::BundleInfo;
use crate::io::config::ResolverConfig;
use crate::io::deps_json::{Manifest, RidGraphSource};
use crate::validate::{ValidatedChain, validate_chain};

static EMPTY_RID_GRAPH: RidFallbackGraph = RidFallbackGraph::new();

/// Host launch arguments the resolver consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    pub app_root: PathBuf,
    /// Application manifest; the file may be absent.
    pub deps_path: PathBuf,
    pub host_mode: HostMode,
    pub managed_application: PathBuf,
    pub core_servicing: Option<PathBuf>,
    /// Additional manifests and directories joined with the path-list separator.
    pub additional_deps_serialized: String,
    /// Extra probe directories, package layout.
    pub probe_paths: Vec<PathBuf>,
}

impl LaunchArgs {
    /// Muxer launch of `managed_application` with no extra probing inputs.
    pub fn new(app_root: PathBuf, deps_path: PathBuf, managed_application: PathBuf) -> Self {
        Self {
            app_root,
            deps_path,
            host_mode: HostMode::Muxer,
            managed_application,
            core_servicing: None,
            additional_deps_serialized: String::new(),
            probe_paths: Vec::new(),
        }
    }
}

/// One framework (or the application) in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxDefinition {
    pub name: String,
    pub version: String,
    pub dir: PathBuf,
}

impl FxDefinition {
    pub fn new(name: impl Into<String>, version: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dir: dir.into(),
        }
    }

    /// The application's own definition.
    pub fn application(dir: impl Into<PathBuf>) -> Self {
        Self::new("", "", dir)
    }

    /// `<dir>/<name>.deps.json`.
    pub fn deps_path(&self) -> PathBuf {
        self.dir.join(format!("{}.deps.json", self.name))
    }
}

/// Ordered framework definitions: the application first, the root framework last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxDefinitions {
    levels: Vec<FxDefinition>,
}

impl FxDefinitions {
    pub fn new(application: FxDefinition) -> Self {
        Self {
            levels: vec![application],
        }
    }

    /// Append a framework below the current root; it becomes the new root.
    pub fn with_framework(mut self, framework: FxDefinition) -> Self {
        self.levels.push(framework);
        self
    }

    pub fn application(&self) -> &FxDefinition {
        &self.levels[0]
    }

    pub fn root(&self) -> &FxDefinition {
        &self.levels[self.levels.len() - 1]
    }

    pub fn root_level(&self) -> FxLevel {
        FxLevel::new(self.levels.len() - 1)
    }

    pub fn has_frameworks(&self) -> bool {
        self.levels.len() > 1
    }

    pub fn get(&self, level: FxLevel) -> Option<&FxDefinition> {
        self.levels.get(level.index())
    }

    /// Every level, application first.
    pub fn levels(&self) -> impl DoubleEndedIterator<Item = (FxLevel, &FxDefinition)> {
        self.levels
            .iter()
            .enumerate()
            .map(|(index, fx)| (FxLevel::new(index), fx))
    }

    /// Framework levels only, highest framework first.
    pub fn frameworks(&self) -> impl Iterator<Item = (FxLevel, &FxDefinition)> {
        self.levels().skip(1)
    }
}

/// Inputs for [`FrameworkChain::build`].
pub struct ChainRequest<'a> {
    pub args: &'a LaunchArgs,
    pub definitions: &'a FxDefinitions,
    /// Graph to use when the root framework is not part of `definitions`.
    pub root_rid_graph: Option<&'a RidFallbackGraph>,
    pub is_framework_dependent: bool,
    pub config: &'a ResolverConfig,
    pub bundle: &'a dyn BundleInfo,
    /// Shared store roots before the `<arch>/<tfm>` suffix.
    pub shared_store_roots: Vec<PathBuf>,
}

/// Manifests for every level of an application's framework chain.
pub struct FrameworkChain<'a> {
    args: &'a LaunchArgs,
    definitions: &'a FxDefinitions,
    /// Indexed by level: application first, root last.
    manifests: Vec<Manifest>,
    additional: Vec<Manifest>,
    external_rid_graph: Option<&'a RidFallbackGraph>,
    probes: Vec<ProbeConfig>,
    is_framework_dependent: bool,
    names: NameComparison,
    bundle: &'a dyn BundleInfo,
}

impl<'a> FrameworkChain<'a> {
    /// Load every manifest and build the probe set.
    ///
    /// Never fails: missing or broken manifests are reported by [`Self::validate`].
    pub fn build(request: ChainRequest<'a>) -> Self {
        let ChainRequest {
            args,
            definitions,
            root_rid_graph,
            is_framework_dependent,
            config,
            bundle,
            shared_store_roots,
        } = request;
        let host_rid = config.host_rid.as_str();
        let deps_path = |level: FxLevel, fx: &FxDefinition| {
            if level.is_app() {
                args.deps_path.clone()
            } else {
                fx.deps_path()
            }
        };

        let root_level = definitions.root_level();
        let root_path = deps_path(root_level, definitions.root());
        debug!(level = %root_level, path = %root_path.display(), "using manifest");
        let root = match root_rid_graph {
            None => Manifest::load(&root_path, RidGraphSource::Own, host_rid),
            Some(graph) => Manifest::load(&root_path, RidGraphSource::Borrow(graph), host_rid),
        };
        let graph = root_rid_graph
            .or(root.owned_rid_graph())
            .unwrap_or(&EMPTY_RID_GRAPH);
        if !graph.is_empty() && !graph.contains(host_rid) {
            warn!(host_rid, "host RID not in the RID fallback graph");
        }

        let mut manifests: Vec<Manifest> = definitions
            .levels()
            .rev()
            .skip(1)
            .map(|(level, fx)| {
                let path = deps_path(level, fx);
                debug!(level = %level, path = %path.display(), "using manifest");
                Manifest::load(&path, RidGraphSource::Borrow(graph), host_rid)
            })
            .collect();
        manifests.reverse();

        let root_framework = (is_framework_dependent && definitions.has_frameworks()).then(|| {
            let root = definitions.root();
            RootFramework {
                name: &root.name,
                version: &root.version,
            }
        });
        let additional = additional_deps_paths(&args.additional_deps_serialized, root_framework)
            .into_iter()
            .map(|path| {
                debug!(path = %path.display(), "using additional manifest");
                Manifest::load(&path, RidGraphSource::Borrow(graph), host_rid)
            })
            .collect();

        let shared_stores = if is_framework_dependent {
            shared_stores(config, &root, shared_store_roots)
        } else {
            Vec::new()
        };
        manifests.push(root);

        let probes = build_probe_set(&ProbeSetInputs {
            servicing_root: args.core_servicing.as_deref(),
            probe_paths: &args.probe_paths,
            shared_stores: &shared_stores,
            framework_dirs: definitions
                .frameworks()
                .map(|(level, fx)| (level, fx.dir.as_path()))
                .collect(),
            app_dir: &args.app_root,
            verify_chain_dirs: config.probing.verify_chain_dirs,
        });
        for probe in &probes {
            debug!(root = %probe.root.display(), kind = ?probe.kind, verify = probe.verify_existence, "probe config");
        }

        Self {
            args,
            definitions,
            manifests,
            additional,
            external_rid_graph: root_rid_graph,
            probes,
            is_framework_dependent,
            names: config.resolution.asset_names,
            bundle,
        }
    }

    /// Check manifests; resolution needs the returned proof.
    pub fn validate(&self) -> Result<ValidatedChain<'_, 'a>> {
        validate_chain(self)
    }

    pub fn args(&self) -> &'a LaunchArgs {
        self.args
    }

    pub fn definitions(&self) -> &'a FxDefinitions {
        self.definitions
    }

    /// Chain manifests with their levels, application first.
    pub fn levels(&self) -> impl Iterator<Item = (FxLevel, &Manifest)> {
        self.manifests
            .iter()
            .enumerate()
            .map(|(index, manifest)| (FxLevel::new(index), manifest))
    }

    pub fn application(&self) -> &Manifest {
        &self.manifests[0]
    }

    pub fn root_manifest(&self) -> &Manifest {
        &self.manifests[self.manifests.len() - 1]
    }

    pub fn additional_manifests(&self) -> &[Manifest] {
        &self.additional
    }

    /// The graph every manifest selected RID-specific assets with.
    pub fn rid_fallback_graph(&self) -> &RidFallbackGraph {
        self.external_rid_graph
            .or_else(|| self.root_manifest().owned_rid_graph())
            .unwrap_or(&EMPTY_RID_GRAPH)
    }

    pub fn probe_configs(&self) -> &[ProbeConfig] {
        &self.probes
    }

    pub fn is_framework_dependent(&self) -> bool {
        self.is_framework_dependent
    }

    pub fn names(&self) -> NameComparison {
        self.names
    }

    pub fn bundle(&self) -> &'a dyn BundleInfo {
        self.bundle
    }

    /// Application directory reported to the runtime; see [`effective_app_dir`].
    pub fn app_dir(&self) -> String {
        effective_app_dir(
            self.args.host_mode,
            &self.args.app_root,
            self.bundle.compat_extraction_dir(),
        )
    }
}

/// Shared store roots suffixed with `<arch>/<tfm>`.
fn shared_stores(config: &ResolverConfig, root: &Manifest, roots: Vec<PathBuf>) -> Vec<PathBuf> {
    if roots.is_empty() {
        return roots;
    }
    let tfm = config
        .probing
        .store_tfm
        .clone()
        .or_else(|| root.target_framework().and_then(short_tfm));
    let Some(tfm) = tfm else {
        warn!(path = %root.path().display(), "no target framework for shared stores; skipping them");
        return Vec::new();
    };
    roots
        .into_iter()
        .map(|store| store_dir(&store, &config.probing.store_arch, &tfm))
        .collect()
}

fn store_dir(store: &Path, arch: &str, tfm: &str) -> PathBuf {
    store.join(arch).join(tfm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::probe::ProbeKind;
    use crate::io::bundle::NoBundle;
    use crate::test_support::{DepsBuilder, LibrarySpec, TestLayout, launch_args, test_config};

    #[test]
    fn root_manifest_owns_the_graph_and_others_borrow_it() {
        let layout = TestLayout::new().expect("layout");
        let fx_dir = layout.dir("fx/Microsoft.NETCore.App/8.0.1").expect("fx");
        layout
            .write_manifest(
                "fx/Microsoft.NETCore.App/8.0.1/Microsoft.NETCore.App.deps.json",
                &DepsBuilder::new().runtimes("linux-x64", &["linux", "unix", "any"]),
            )
            .expect("fx manifest");
        let app_dir = layout.dir("app").expect("app");
        layout
            .write_manifest("app/app.deps.json", &DepsBuilder::new().library(LibrarySpec::project("App", "1.0.0").runtime("App.dll")))
            .expect("app manifest");

        let args = launch_args(&app_dir);
        let definitions = FxDefinitions::new(FxDefinition::application(&app_dir))
            .with_framework(FxDefinition::new("Microsoft.NETCore.App", "8.0.1", &fx_dir));
        let config = test_config();
        let chain = FrameworkChain::build(ChainRequest {
            args: &args,
            definitions: &definitions,
            root_rid_graph: None,
            is_framework_dependent: true,
            config: &config,
            bundle: &NoBundle,
            shared_store_roots: Vec::new(),
        });

        assert!(chain.application().owned_rid_graph().is_none());
        assert!(chain.root_manifest().owned_rid_graph().is_some());
        assert!(chain.rid_fallback_graph().contains("linux-x64"));
        assert_eq!(chain.root_manifest().path(), fx_dir.join("Microsoft.NETCore.App.deps.json"));
        assert_eq!(chain.application().path(), app_dir.join("app.deps.json"));
    }

    #[test]
    fn external_graph_is_borrowed_by_every_level() {
        let layout = TestLayout::new().expect("layout");
        let app_dir = layout.dir("app").expect("app");
        let args = launch_args(&app_dir);
        let definitions = FxDefinitions::new(FxDefinition::application(&app_dir));
        let graph: RidFallbackGraph = [("linux-x64", vec!["unix".to_string()])].into_iter().collect();
        let config = test_config();

        let chain = FrameworkChain::build(ChainRequest {
            args: &args,
            definitions: &definitions,
            root_rid_graph: Some(&graph),
            is_framework_dependent: false,
            config: &config,
            bundle: &NoBundle,
            shared_store_roots: Vec::new(),
        });

        assert!(chain.root_manifest().owned_rid_graph().is_none());
        assert_eq!(chain.rid_fallback_graph(), &graph);
    }

    #[test]
    fn shared_stores_only_for_framework_dependent_apps() {
        let layout = TestLayout::new().expect("layout");
        let fx_dir = layout.dir("fx").expect("fx");
        layout
            .write_manifest("fx/Microsoft.NETCore.App.deps.json", &DepsBuilder::new())
            .expect("fx manifest");
        let app_dir = layout.dir("app").expect("app");
        let args = launch_args(&app_dir);
        let definitions = FxDefinitions::new(FxDefinition::application(&app_dir))
            .with_framework(FxDefinition::new("Microsoft.NETCore.App", "8.0.1", &fx_dir));
        let config = test_config();
        let store = layout.path("store");

        let build = |is_framework_dependent| {
            FrameworkChain::build(ChainRequest {
                args: &args,
                definitions: &definitions,
                root_rid_graph: None,
                is_framework_dependent,
                config: &config,
                bundle: &NoBundle,
                shared_store_roots: vec![store.clone()],
            })
        };

        let chain = build(true);
        let stores: Vec<&Path> = chain
            .probe_configs()
            .iter()
            .filter(|probe| probe.kind == ProbeKind::SharedStore)
            .map(|probe| probe.root.as_path())
            .collect();
        assert_eq!(stores, vec![store.join("x64").join("net8.0").as_path()]);

        let chain = build(false);
        assert!(
            chain
                .probe_configs()
                .iter()
                .all(|probe| probe.kind != ProbeKind::SharedStore)
        );
    }

    #[test]
    fn fx_definitions_expose_named_ends() {
        let definitions = FxDefinitions::new(FxDefinition::application("app"))
            .with_framework(FxDefinition::new("Web", "8.0.0", "web"))
            .with_framework(FxDefinition::new("Core", "8.0.0", "core"));
        assert_eq!(definitions.application().dir, PathBuf::from("app"));
        assert_eq!(definitions.root().name, "Core");
        assert_eq!(definitions.root_level(), FxLevel::new(2));
        let names: Vec<&str> = definitions.frameworks().map(|(_, fx)| fx.name.as_str()).collect();
        assert_eq!(names, vec!["Web", "Core"]);
        assert_eq!(
            definitions.get(FxLevel::new(1)).expect("web").deps_path(),
            PathBuf::from("web").join("Web.deps.json")
        );
    }
}
