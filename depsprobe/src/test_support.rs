//! Test-only helpers for laying out applications, frameworks and manifests on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

use crate::chain::LaunchArgs;
use crate::core::names::NameComparison;
use crate::io::config::ResolverConfig;

/// Target framework moniker used by generated manifests.
pub const TEST_TARGET: &str = ".NETCoreApp,Version=v8.0";

/// Temporary directory tree with a canonical root, so verified probe hits
/// compare equal to paths built from it.
pub struct TestLayout {
    _temp: TempDir,
    root: PathBuf,
}

impl TestLayout {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let root = fs::canonicalize(temp.path()).context("canonicalize tempdir")?;
        Ok(Self { _temp: temp, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/relative`, without touching the disk.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Create `root/relative` and its parents.
    pub fn dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        fs::create_dir_all(&path).with_context(|| format!("create {}", path.display()))?;
        Ok(path)
    }

    /// Create an empty file at `root/relative`.
    pub fn touch(&self, relative: &str) -> Result<PathBuf> {
        self.write(relative, "")
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_manifest(&self, relative: &str, manifest: &DepsBuilder) -> Result<PathBuf> {
        let payload = serde_json::to_string_pretty(&manifest.to_value()).context("serialize manifest")?;
        self.write(relative, &payload)
    }
}

/// One `targets`/`libraries` pair in a generated manifest.
#[derive(Debug, Clone)]
pub struct LibrarySpec {
    key: String,
    kind: &'static str,
    serviceable: bool,
    path: Option<String>,
    runtime: Vec<String>,
    native: Vec<String>,
    resources: Vec<(String, String)>,
    runtime_targets: Vec<(String, String, &'static str)>,
}

impl LibrarySpec {
    fn new(name: &str, version: &str, kind: &'static str) -> Self {
        Self {
            key: format!("{name}/{version}"),
            kind,
            serviceable: false,
            path: None,
            runtime: Vec::new(),
            native: Vec::new(),
            resources: Vec::new(),
            runtime_targets: Vec::new(),
        }
    }

    pub fn project(name: &str, version: &str) -> Self {
        Self::new(name, version, "project")
    }

    pub fn package(name: &str, version: &str) -> Self {
        Self::new(name, version, "package")
    }

    pub fn serviceable(mut self) -> Self {
        self.serviceable = true;
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn runtime(mut self, asset: &str) -> Self {
        self.runtime.push(asset.to_string());
        self
    }

    pub fn native(mut self, asset: &str) -> Self {
        self.native.push(asset.to_string());
        self
    }

    pub fn resource(mut self, asset: &str, locale: &str) -> Self {
        self.resources.push((asset.to_string(), locale.to_string()));
        self
    }

    /// RID-specific asset; `asset_type` is `runtime`, `native` or `resources`.
    pub fn rid_asset(mut self, asset: &str, rid: &str, asset_type: &'static str) -> Self {
        self.runtime_targets
            .push((asset.to_string(), rid.to_string(), asset_type));
        self
    }

    fn target_value(&self) -> Value {
        let mut target = Map::new();
        if !self.runtime.is_empty() {
            target.insert("runtime".to_string(), empty_assets(&self.runtime));
        }
        if !self.native.is_empty() {
            target.insert("native".to_string(), empty_assets(&self.native));
        }
        if !self.resources.is_empty() {
            let resources = self
                .resources
                .iter()
                .map(|(asset, locale)| (asset.clone(), json!({ "locale": locale })))
                .collect();
            target.insert("resources".to_string(), Value::Object(resources));
        }
        if !self.runtime_targets.is_empty() {
            let targets = self
                .runtime_targets
                .iter()
                .map(|(asset, rid, asset_type)| {
                    (asset.clone(), json!({ "rid": rid, "assetType": asset_type }))
                })
                .collect();
            target.insert("runtimeTargets".to_string(), Value::Object(targets));
        }
        Value::Object(target)
    }

    fn library_value(&self) -> Value {
        let mut library = json!({ "type": self.kind, "serviceable": self.serviceable });
        if let (Some(path), Some(object)) = (&self.path, library.as_object_mut()) {
            object.insert("path".to_string(), Value::String(path.clone()));
        }
        library
    }
}

fn empty_assets(assets: &[String]) -> Value {
    Value::Object(
        assets
            .iter()
            .map(|asset| (asset.clone(), json!({})))
            .collect(),
    )
}

/// Builder for `*.deps.json` documents.
#[derive(Debug, Clone, Default)]
pub struct DepsBuilder {
    libraries: Vec<LibrarySpec>,
    runtimes: Vec<(String, Vec<String>)>,
}

impl DepsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library(mut self, library: LibrarySpec) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn runtimes(mut self, rid: &str, fallbacks: &[&str]) -> Self {
        self.runtimes.push((
            rid.to_string(),
            fallbacks.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    pub fn to_value(&self) -> Value {
        let target: Map<String, Value> = self
            .libraries
            .iter()
            .map(|library| (library.key.clone(), library.target_value()))
            .collect();
        let libraries: Map<String, Value> = self
            .libraries
            .iter()
            .map(|library| (library.key.clone(), library.library_value()))
            .collect();
        let runtimes: Map<String, Value> = self
            .runtimes
            .iter()
            .map(|(rid, fallbacks)| (rid.clone(), json!(fallbacks)))
            .collect();
        json!({
            "runtimeTarget": { "name": TEST_TARGET },
            "targets": { TEST_TARGET: target },
            "libraries": libraries,
            "runtimes": runtimes,
        })
    }
}

/// Muxer launch of `<app_dir>/App.dll` with `<app_dir>/app.deps.json`.
pub fn launch_args(app_dir: &Path) -> LaunchArgs {
    LaunchArgs::new(
        app_dir.to_path_buf(),
        app_dir.join("app.deps.json"),
        app_dir.join("App.dll"),
    )
}

/// Deterministic configuration: `linux-x64`, case-sensitive names, `x64` stores.
pub fn test_config() -> ResolverConfig {
    let mut config = ResolverConfig {
        host_rid: "linux-x64".to_string(),
        ..ResolverConfig::default()
    };
    config.resolution.asset_names = NameComparison::CaseSensitive;
    config.probing.store_arch = "x64".to_string();
    config
}
