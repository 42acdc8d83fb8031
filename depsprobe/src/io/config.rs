//! Resolver configuration stored in `depsprobe.toml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::names::NameComparison;
use crate::core::types::split_path_list;

/// Environment variable listing extra shared package stores.
pub const SHARED_STORE_ENV: &str = "DOTNET_SHARED_STORE";

/// Resolver configuration (TOML).
///
/// Missing fields default to values derived from the build target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Runtime identifier of this host (`linux-x64`), used for RID-specific assets.
    pub host_rid: String,

    pub resolution: ResolutionConfig,

    pub probing: ProbingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Case sensitivity of asset-name deduplication.
    pub asset_names: NameComparison,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbingConfig {
    /// Verify existence under framework and application directories too.
    pub verify_chain_dirs: bool,

    /// Shared package store roots probed after `DOTNET_SHARED_STORE`.
    pub global_stores: Vec<PathBuf>,

    /// Architecture directory inside a shared store (`x64`).
    pub store_arch: String,

    /// TFM directory inside a shared store; derived from the root manifest when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_tfm: Option<String>,
}

impl Default for ProbingConfig {
    fn default() -> Self {
        Self {
            verify_chain_dirs: false,
            global_stores: Vec::new(),
            store_arch: target_arch().to_string(),
            store_tfm: None,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            host_rid: format!("{}-{}", target_os(), target_arch()),
            resolution: ResolutionConfig::default(),
            probing: ProbingConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host_rid.trim().is_empty() {
            return Err(anyhow!("host_rid must be non-empty"));
        }
        if self.probing.store_arch.trim().is_empty() {
            return Err(anyhow!("probing.store_arch must be non-empty"));
        }
        if matches!(&self.probing.store_tfm, Some(tfm) if tfm.trim().is_empty()) {
            return Err(anyhow!("probing.store_tfm must be non-empty when set"));
        }
        Ok(())
    }

    /// Shared store roots: `shared_store_env` entries, then `global_stores`.
    pub fn shared_store_roots(&self, shared_store_env: Option<&str>) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = shared_store_env
            .map(|value| split_path_list(value).into_iter().map(PathBuf::from).collect())
            .unwrap_or_default();
        roots.extend(self.probing.global_stores.iter().cloned());
        roots
    }

    /// Shared store roots read from the process environment.
    pub fn shared_store_roots_from_env(&self) -> Vec<PathBuf> {
        let value = env::var(SHARED_STORE_ENV).ok();
        self.shared_store_roots(value.as_deref())
    }
}

fn target_os() -> &'static str {
    match env::consts::OS {
        "windows" => "win",
        "macos" => "osx",
        other => other,
    }
}

fn target_arch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ResolverConfig::default()`.
pub fn load_config(path: &Path) -> Result<ResolverConfig> {
    if !path.exists() {
        let cfg = ResolverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ResolverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Render config as TOML with a trailing newline.
pub fn render_config(cfg: &ResolverConfig) -> Result<String> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::join_path_list;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, ResolverConfig::default());
    }

    #[test]
    fn rendered_config_loads_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("depsprobe.toml");
        let mut cfg = ResolverConfig::default();
        cfg.resolution.asset_names = NameComparison::CaseInsensitive;
        cfg.probing.store_tfm = Some("net8.0".to_string());
        let rendered = render_config(&cfg).expect("render");
        assert!(rendered.ends_with('\n'));
        fs::write(&path, rendered).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("depsprobe.toml");
        fs::write(
            &path,
            "host_rid = \"linux-musl-x64\"\n[resolution]\nasset_names = \"case-sensitive\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.host_rid, "linux-musl-x64");
        assert_eq!(cfg.resolution.asset_names, NameComparison::CaseSensitive);
        assert_eq!(cfg.probing, ProbingConfig::default());
    }

    #[test]
    fn empty_host_rid_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("depsprobe.toml");
        fs::write(&path, "host_rid = \"\"\n").expect("write");
        let err = load_config(&path).expect_err("should fail");
        assert!(err.to_string().contains("host_rid"));
    }

    #[test]
    fn shared_store_env_precedes_global_stores() {
        let mut cfg = ResolverConfig::default();
        cfg.probing.global_stores = vec![PathBuf::from("global")];
        let env_value = join_path_list(["env-a", "env-b"]);
        assert_eq!(
            cfg.shared_store_roots(Some(&env_value)),
            vec![
                PathBuf::from("env-a"),
                PathBuf::from("env-b"),
                PathBuf::from("global")
            ]
        );
        assert_eq!(cfg.shared_store_roots(None), vec![PathBuf::from("global")]);
    }
}
