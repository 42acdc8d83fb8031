//! Dependency manifest (`*.deps.json`) reader.
//!
//! Loading never fails outright: a missing file yields an empty manifest that
//! reports `exists() == false`, and any read, schema or shape problem yields an
//! empty manifest that reports `is_valid() == false`. The validator decides
//! which of those are fatal.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::entry::{DepsEntry, Library};
use crate::core::rid::RidFallbackGraph;
use crate::core::types::AssetKind;

const DEPS_SCHEMA: &str = include_str!("../../schemas/deps.schema.json");

/// Where a manifest gets the RID fallback graph it selects assets with.
#[derive(Debug, Clone, Copy)]
pub enum RidGraphSource<'g> {
    /// Build the graph from this manifest's own `runtimes` section and keep it.
    Own,
    /// Use a graph owned elsewhere for the duration of the load.
    Borrow(&'g RidFallbackGraph),
}

/// A parsed dependency manifest for one framework level.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    exists: bool,
    invalid_reason: Option<String>,
    entries: Vec<DepsEntry>,
    owned_rid_graph: Option<RidFallbackGraph>,
    target_framework: Option<String>,
}

impl Manifest {
    /// Load `path`, selecting RID-specific assets for `host_rid`.
    pub fn load(path: &Path, source: RidGraphSource<'_>, host_rid: &str) -> Self {
        let owns_graph = matches!(source, RidGraphSource::Own);
        let mut manifest = Self {
            path: path.to_path_buf(),
            exists: path.is_file(),
            invalid_reason: None,
            entries: Vec::new(),
            owned_rid_graph: owns_graph.then(RidFallbackGraph::new),
            target_framework: None,
        };
        if !manifest.exists {
            debug!(path = %path.display(), "manifest not found");
            return manifest;
        }

        match read_manifest(path, source, host_rid) {
            Ok(parsed) => {
                debug!(
                    path = %path.display(),
                    entries = parsed.entries.len(),
                    owns_graph,
                    "manifest loaded"
                );
                manifest.entries = parsed.entries;
                manifest.target_framework = parsed.target_framework;
                if owns_graph {
                    manifest.owned_rid_graph = parsed.rid_graph;
                }
            }
            Err(err) => {
                debug!(path = %path.display(), error = %format!("{err:#}"), "manifest invalid");
                manifest.invalid_reason = Some(format!("{err:#}"));
            }
        }
        manifest
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_reason.is_none()
    }

    pub fn invalid_reason(&self) -> Option<&str> {
        self.invalid_reason.as_deref()
    }

    /// All entries, in declaration order.
    pub fn entries(&self) -> &[DepsEntry] {
        &self.entries
    }

    /// Entries of one asset kind, in declaration order.
    pub fn entries_of(&self, kind: AssetKind) -> impl Iterator<Item = &DepsEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// The RID fallback graph, if this manifest is the one that owns it.
    pub fn owned_rid_graph(&self) -> Option<&RidFallbackGraph> {
        self.owned_rid_graph.as_ref()
    }

    /// Framework part of `runtimeTarget.name` (`.NETCoreApp,Version=v8.0`).
    pub fn target_framework(&self) -> Option<&str> {
        self.target_framework.as_deref()
    }
}

struct ParsedManifest {
    entries: Vec<DepsEntry>,
    rid_graph: Option<RidFallbackGraph>,
    target_framework: Option<String>,
}

fn read_manifest(
    path: &Path,
    source: RidGraphSource<'_>,
    host_rid: &str,
) -> Result<ParsedManifest> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse manifest {}", path.display()))?;
    validate_schema(&value)?;
    let document = DepsDocument::deserialize(&value)
        .with_context(|| format!("deserialize manifest {}", path.display()))?;

    let target_framework = document.target_framework();
    let (rid_graph, entries) = match source {
        RidGraphSource::Own => {
            let graph = document.rid_graph();
            let entries = document.entries(&graph, host_rid)?;
            (Some(graph), entries)
        }
        RidGraphSource::Borrow(graph) => (None, document.entries(graph, host_rid)?),
    };
    Ok(ParsedManifest {
        entries,
        rid_graph,
        target_framework,
    })
}

fn validate_schema(manifest: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(DEPS_SCHEMA).context("parse manifest schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(manifest) {
        let messages = compiled
            .iter_errors(manifest)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "manifest schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepsDocument {
    #[serde(default)]
    runtime_target: Option<RuntimeTarget>,
    targets: Map<String, Value>,
    #[serde(default)]
    libraries: Map<String, Value>,
    #[serde(default)]
    runtimes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RuntimeTarget {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetLibrary {
    #[serde(default)]
    runtime: Map<String, Value>,
    #[serde(default)]
    native: Map<String, Value>,
    #[serde(default)]
    resources: Map<String, Value>,
    #[serde(default)]
    runtime_targets: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProperties {
    locale: Option<String>,
    rid: Option<String>,
    asset_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LibraryProperties {
    #[serde(default)]
    serviceable: bool,
    #[serde(default)]
    path: Option<String>,
}

impl DepsDocument {
    fn target_framework(&self) -> Option<String> {
        let name = &self.runtime_target.as_ref()?.name;
        let framework = name.split('/').next().unwrap_or(name);
        Some(framework.to_string())
    }

    fn rid_graph(&self) -> RidFallbackGraph {
        self.runtimes
            .iter()
            .map(|(rid, fallbacks)| (rid.clone(), fallbacks.clone()))
            .collect()
    }

    /// The target named by `runtimeTarget`, or the first declared target.
    fn target(&self) -> Option<(&String, &Value)> {
        let named = self
            .runtime_target
            .as_ref()
            .and_then(|target| self.targets.get_key_value(&target.name));
        named.or_else(|| self.targets.iter().next())
    }

    fn library(&self, key: &str) -> Result<Library> {
        let properties = match self.libraries.get(key) {
            Some(value) => LibraryProperties::deserialize(value)
                .with_context(|| format!("parse library {key}"))?,
            None => LibraryProperties::default(),
        };
        Ok(Library {
            path: properties.path,
            serviceable: properties.serviceable,
            ..Library::from_key(key)
        })
    }

    fn entries(&self, graph: &RidFallbackGraph, host_rid: &str) -> Result<Vec<DepsEntry>> {
        let Some((target_name, target)) = self.target() else {
            return Ok(Vec::new());
        };
        let target = target
            .as_object()
            .ok_or_else(|| anyhow!("target {target_name} is not an object"))?;

        let mut entries = Vec::new();
        for (key, value) in target {
            let library = self.library(key)?;
            let assets = TargetLibrary::deserialize(value)
                .with_context(|| format!("parse target library {key}"))?;
            for kind in [AssetKind::Runtime, AssetKind::Native, AssetKind::Resources] {
                entries.extend(assets.entries_of(kind, &library, graph, host_rid)?);
            }
        }
        Ok(entries)
    }
}

impl TargetLibrary {
    fn group(&self, kind: AssetKind) -> &Map<String, Value> {
        match kind {
            AssetKind::Runtime => &self.runtime,
            AssetKind::Native => &self.native,
            AssetKind::Resources => &self.resources,
        }
    }

    /// Entries of `kind`, preferring the best-matching RID-specific variant group.
    fn entries_of(
        &self,
        kind: AssetKind,
        library: &Library,
        graph: &RidFallbackGraph,
        host_rid: &str,
    ) -> Result<Vec<DepsEntry>> {
        let mut rid_specific = Vec::new();
        for (path, value) in &self.runtime_targets {
            let properties = AssetProperties::deserialize(value)
                .with_context(|| format!("parse runtime target {path}"))?;
            if properties.asset_type.as_deref() == Some(kind.as_str()) {
                rid_specific.push((path, properties));
            }
        }

        if !rid_specific.is_empty() {
            let best = graph
                .best_match(
                    host_rid,
                    rid_specific
                        .iter()
                        .filter_map(|(_, properties)| properties.rid.as_deref()),
                )
                .map(str::to_string);
            match best {
                Some(rid) => {
                    return Ok(rid_specific
                        .into_iter()
                        .filter(|(_, properties)| properties.rid.as_deref() == Some(rid.as_str()))
                        .map(|(path, properties)| make_entry(library, kind, path, properties))
                        .collect());
                }
                None => debug!(
                    library = %library.name,
                    kind = %kind,
                    host_rid,
                    "no RID-specific variant matches host; using RID-agnostic assets"
                ),
            }
        }

        let mut entries = Vec::new();
        for (path, value) in self.group(kind) {
            let properties = AssetProperties::deserialize(value)
                .with_context(|| format!("parse {kind} asset {path}"))?;
            entries.push(make_entry(library, kind, path, properties));
        }
        Ok(entries)
    }
}

fn make_entry(
    library: &Library,
    kind: AssetKind,
    path: &str,
    properties: AssetProperties,
) -> DepsEntry {
    let mut entry = DepsEntry::new(library.clone(), kind, path);
    entry.rid = properties.rid;
    if kind == AssetKind::Resources && properties.locale.is_some() {
        entry.culture = properties.locale;
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value).expect("json")).expect("write");
        path
    }

    fn sample() -> Value {
        json!({
            "runtimeTarget": { "name": ".NETCoreApp,Version=v8.0" },
            "targets": {
                ".NETCoreApp,Version=v8.0": {
                    "App/1.0.0": {
                        "runtime": { "App.dll": {} },
                        "resources": { "de/App.resources.dll": { "locale": "de" } }
                    },
                    "Zeta/2.0.0": {
                        "runtime": { "lib/net8.0/Zeta.dll": { "assemblyVersion": "2.0.0.0" } },
                        "native": { "runtimes/any/native/libzeta.so": {} },
                        "runtimeTargets": {
                            "runtimes/unix/native/libzeta.so": { "rid": "unix", "assetType": "native" },
                            "runtimes/linux-x64/native/libzeta.so": { "rid": "linux-x64", "assetType": "native" },
                            "runtimes/win/native/zeta.dll": { "rid": "win", "assetType": "native" }
                        }
                    },
                    "Alpha/1.0.0": {
                        "runtime": { "lib/net8.0/Alpha.dll": {} }
                    }
                }
            },
            "libraries": {
                "App/1.0.0": { "type": "project", "serviceable": false },
                "Zeta/2.0.0": { "type": "package", "serviceable": true, "path": "zeta/2.0.0" },
                "Alpha/1.0.0": { "type": "package" }
            },
            "runtimes": {
                "linux-x64": ["linux", "unix-x64", "unix", "any", "base"]
            }
        })
    }

    #[test]
    fn missing_manifest_is_valid_but_absent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let manifest = Manifest::load(&temp.path().join("app.deps.json"), RidGraphSource::Own, "linux-x64");
        assert!(!manifest.exists());
        assert!(manifest.is_valid());
        assert!(manifest.entries().is_empty());
        assert_eq!(manifest.owned_rid_graph(), Some(&RidFallbackGraph::new()));
    }

    #[test]
    fn entries_keep_declaration_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "app.deps.json", &sample());
        let manifest = Manifest::load(&path, RidGraphSource::Own, "linux-x64");
        assert!(manifest.is_valid(), "{:?}", manifest.invalid_reason());

        let names: Vec<&str> = manifest
            .entries_of(AssetKind::Runtime)
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["App", "Zeta", "Alpha"]);
        assert_eq!(manifest.target_framework(), Some(".NETCoreApp,Version=v8.0"));

        let zeta = manifest
            .entries_of(AssetKind::Runtime)
            .find(|entry| entry.name == "Zeta")
            .expect("zeta");
        assert!(zeta.library.serviceable);
        assert_eq!(zeta.library.path.as_deref(), Some("zeta/2.0.0"));
    }

    #[test]
    fn owner_selects_most_specific_rid_variant() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "app.deps.json", &sample());
        let manifest = Manifest::load(&path, RidGraphSource::Own, "linux-x64");

        let natives: Vec<&str> = manifest
            .entries_of(AssetKind::Native)
            .map(|entry| entry.relative_path.as_str())
            .collect();
        assert_eq!(natives, vec!["runtimes/linux-x64/native/libzeta.so"]);
        assert!(manifest.owned_rid_graph().expect("graph").contains("linux-x64"));
    }

    #[test]
    fn borrower_without_matching_rid_falls_back_to_agnostic_assets() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "app.deps.json", &sample());
        let graph = RidFallbackGraph::new();
        let manifest = Manifest::load(&path, RidGraphSource::Borrow(&graph), "osx-arm64");

        assert_eq!(manifest.owned_rid_graph(), None);
        let natives: Vec<&str> = manifest
            .entries_of(AssetKind::Native)
            .map(|entry| entry.relative_path.as_str())
            .collect();
        assert_eq!(natives, vec!["runtimes/any/native/libzeta.so"]);
    }

    #[test]
    fn resources_carry_locale() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "app.deps.json", &sample());
        let manifest = Manifest::load(&path, RidGraphSource::Own, "linux-x64");
        let resource = manifest
            .entries_of(AssetKind::Resources)
            .next()
            .expect("resource");
        assert_eq!(resource.culture.as_deref(), Some("de"));
        assert_eq!(resource.name, "App.resources");
    }

    #[test]
    fn malformed_json_is_invalid() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.deps.json");
        fs::write(&path, "{ \"targets\": ").expect("write");
        let manifest = Manifest::load(&path, RidGraphSource::Own, "linux-x64");
        assert!(manifest.exists());
        assert!(!manifest.is_valid());
        assert!(manifest.entries().is_empty());
    }

    #[test]
    fn schema_violation_is_invalid() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "bad.deps.json", &json!({ "targets": { "t": { "A/1.0": { "runtime": [] } } } }));
        let manifest = Manifest::load(&path, RidGraphSource::Own, "linux-x64");
        assert!(!manifest.is_valid());
        assert!(
            manifest
                .invalid_reason()
                .expect("reason")
                .contains("schema validation failed")
        );
    }
}
