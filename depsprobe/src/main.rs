//! Launch-time dependency probe resolver.
//!
//! Reads an application's `*.deps.json`, the manifests of the frameworks it
//! runs on and any additional manifests, then prints the trusted assembly
//! list, native and resource probe directories and the engine library path a
//! runtime host would hand to the execution engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use depsprobe::chain::{ChainRequest, FrameworkChain, FxDefinition, FxDefinitions, LaunchArgs};
use depsprobe::core::types::{HostMode, MissingAssets, ResolutionOutput};
use depsprobe::error::ResolveError;
use depsprobe::exit_codes;
use depsprobe::io::bundle::NoBundle;
use depsprobe::io::config::{ResolverConfig, load_config, render_config};
use depsprobe::logging;
use depsprobe::resolve::DepsResolver;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "depsprobe",
    version,
    about = "Resolve runtime probe paths for layered framework applications"
)]
struct Cli {
    /// Resolver configuration (TOML); defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "depsprobe.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate manifests and print the resolved probe paths.
    Resolve {
        #[command(flatten)]
        launch: LaunchOpts,
        /// Leave out assets no probe location can satisfy instead of failing.
        #[arg(long)]
        ignore_missing: bool,
        /// Print a JSON object (including breadcrumbs) instead of `key=value` lines.
        #[arg(long)]
        json: bool,
    },
    /// Check that every manifest in the chain exists and parses.
    Validate {
        #[command(flatten)]
        launch: LaunchOpts,
    },
    /// Print the application directory reported to the runtime.
    AppDir {
        #[command(flatten)]
        launch: LaunchOpts,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args, Debug, Clone)]
struct LaunchOpts {
    /// Application directory.
    #[arg(long)]
    app_root: PathBuf,

    /// Application manifest; defaults to `<managed app>.deps.json`.
    #[arg(long)]
    deps: Option<PathBuf>,

    #[arg(long, default_value = "muxer")]
    host_mode: HostMode,

    /// Managed entry assembly, relative to the application directory.
    #[arg(long)]
    managed_app: Option<PathBuf>,

    /// Framework as `name=version=dir`; repeat from the highest framework to the root.
    #[arg(long = "fx", value_name = "NAME=VERSION=DIR", value_parser = parse_fx)]
    frameworks: Vec<FxDefinition>,

    /// Extra package-layout probe directory (repeatable).
    #[arg(long = "probe-path")]
    probe_paths: Vec<PathBuf>,

    /// Additional manifests or directories, joined with the path-list separator.
    #[arg(long, default_value = "")]
    additional_deps: String,

    /// Servicing root; its `pkgs` directory is probed first.
    #[arg(long)]
    servicing: Option<PathBuf>,

    /// The application carries its own runtime.
    #[arg(long)]
    self_contained: bool,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).with_context(|| "load resolver config")?;
    match cli.command {
        Command::Resolve {
            launch,
            ignore_missing,
            json,
        } => cmd_resolve(&launch, &config, ignore_missing, json),
        Command::Validate { launch } => cmd_validate(&launch, &config),
        Command::AppDir { launch } => cmd_app_dir(&launch, &config),
        Command::Config => {
            print!("{}", render_config(&config)?);
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_resolve(
    launch: &LaunchOpts,
    config: &ResolverConfig,
    ignore_missing: bool,
    json: bool,
) -> Result<i32> {
    let (args, definitions) = launch_inputs(launch)?;
    let chain = build_chain(launch, &args, &definitions, config);
    let validated = match chain.validate() {
        Ok(validated) => validated,
        Err(err) => return Ok(report(&err)),
    };
    let resolver = DepsResolver::new(validated);
    let missing = if ignore_missing {
        MissingAssets::Ignore
    } else {
        MissingAssets::Fail
    };
    let output = match resolver.resolve_probe_paths(missing) {
        Ok(output) => output,
        Err(err) => return Ok(report(&err)),
    };

    if json {
        println!("{}", render_json(&output)?);
    } else {
        print!("{}", render_text(&output));
    }
    Ok(exit_codes::OK)
}

fn cmd_validate(launch: &LaunchOpts, config: &ResolverConfig) -> Result<i32> {
    let (args, definitions) = launch_inputs(launch)?;
    let chain = build_chain(launch, &args, &definitions, config);
    match chain.validate() {
        Ok(_) => {
            println!("ok");
            Ok(exit_codes::OK)
        }
        Err(err) => Ok(report(&err)),
    }
}

fn cmd_app_dir(launch: &LaunchOpts, config: &ResolverConfig) -> Result<i32> {
    let (args, definitions) = launch_inputs(launch)?;
    let chain = build_chain(launch, &args, &definitions, config);
    println!("{}", chain.app_dir());
    Ok(exit_codes::OK)
}

fn build_chain<'a>(
    launch: &LaunchOpts,
    args: &'a LaunchArgs,
    definitions: &'a FxDefinitions,
    config: &'a ResolverConfig,
) -> FrameworkChain<'a> {
    FrameworkChain::build(ChainRequest {
        args,
        definitions,
        root_rid_graph: None,
        is_framework_dependent: !launch.self_contained && definitions.has_frameworks(),
        config,
        bundle: &NoBundle,
        shared_store_roots: config.shared_store_roots_from_env(),
    })
}

fn report(err: &ResolveError) -> i32 {
    eprintln!("{err}");
    if let ResolveError::InvalidManifest { reason, .. } = err {
        eprintln!("  {reason}");
    }
    exit_codes::for_error(err)
}

/// Turn command-line options into launch arguments and framework definitions.
fn launch_inputs(launch: &LaunchOpts) -> Result<(LaunchArgs, FxDefinitions)> {
    let app_root = std::path::absolute(&launch.app_root)
        .with_context(|| format!("resolve app root {}", launch.app_root.display()))?;
    let managed_application = launch
        .managed_app
        .as_ref()
        .map(|path| app_root.join(path))
        .unwrap_or_default();
    let deps_path = match (&launch.deps, launch.managed_app.is_some()) {
        (Some(deps), _) => app_root.join(deps),
        (None, true) => default_deps_path(&managed_application)?,
        (None, false) => return Err(anyhow!("either --deps or --managed-app is required")),
    };
    debug!(app_root = %app_root.display(), deps = %deps_path.display(), "launch inputs");

    let mut definitions = FxDefinitions::new(FxDefinition::application(&app_root));
    for framework in &launch.frameworks {
        let dir = std::path::absolute(&framework.dir)
            .with_context(|| format!("resolve framework dir {}", framework.dir.display()))?;
        definitions = definitions.with_framework(FxDefinition { dir, ..framework.clone() });
    }

    let args = LaunchArgs {
        app_root,
        deps_path,
        host_mode: launch.host_mode,
        managed_application,
        core_servicing: launch.servicing.clone(),
        additional_deps_serialized: launch.additional_deps.clone(),
        probe_paths: launch.probe_paths.clone(),
    };
    Ok((args, definitions))
}

/// `App.dll` → `App.deps.json` next to it.
fn default_deps_path(managed_application: &Path) -> Result<PathBuf> {
    let stem = managed_application
        .file_stem()
        .with_context(|| format!("managed app has no file name: {}", managed_application.display()))?;
    let mut name = stem.to_os_string();
    name.push(".deps.json");
    Ok(managed_application.with_file_name(name))
}

fn parse_fx(value: &str) -> std::result::Result<FxDefinition, String> {
    let mut parts = value.splitn(3, '=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(version), Some(dir))
            if !name.is_empty() && !version.is_empty() && !dir.is_empty() =>
        {
            Ok(FxDefinition::new(name, version, dir))
        }
        _ => Err(format!("expected NAME=VERSION=DIR, got '{value}'")),
    }
}

fn render_text(output: &ResolutionOutput) -> String {
    let paths = &output.probe_paths;
    format!(
        "tpa={}\nnative={}\nresources={}\ncoreclr={}\n",
        paths.tpa, paths.native, paths.resources, paths.coreclr
    )
}

fn render_json(output: &ResolutionOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("serialize resolution output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolve_with_frameworks() {
        let cli = Cli::parse_from([
            "depsprobe",
            "resolve",
            "--app-root",
            "app",
            "--managed-app",
            "App.dll",
            "--fx",
            "Microsoft.AspNetCore.App=8.0.1=fx/web",
            "--fx",
            "Microsoft.NETCore.App=8.0.1=fx/core",
            "--ignore-missing",
        ]);
        let Command::Resolve {
            launch,
            ignore_missing,
            json,
        } = cli.command
        else {
            panic!("expected resolve");
        };
        assert!(ignore_missing);
        assert!(!json);
        assert_eq!(launch.host_mode, HostMode::Muxer);
        let names: Vec<&str> = launch.frameworks.iter().map(|fx| fx.name.as_str()).collect();
        assert_eq!(names, vec!["Microsoft.AspNetCore.App", "Microsoft.NETCore.App"]);
        assert_eq!(cli.config, PathBuf::from("depsprobe.toml"));
    }

    #[test]
    fn parse_fx_rejects_incomplete_values() {
        assert!(parse_fx("Microsoft.NETCore.App=8.0.1").is_err());
        assert!(parse_fx("=8.0.1=dir").is_err());
        let fx = parse_fx("Microsoft.NETCore.App=8.0.1=/usr/share/dotnet=x").expect("fx");
        assert_eq!(fx.dir, PathBuf::from("/usr/share/dotnet=x"));
    }

    #[test]
    fn deps_path_defaults_from_managed_app() {
        let path = default_deps_path(Path::new("/app/App.dll")).expect("deps");
        assert_eq!(path, PathBuf::from("/app/App.deps.json"));
    }

    #[test]
    fn launch_inputs_require_a_manifest_source() {
        let cli = Cli::parse_from(["depsprobe", "app-dir", "--app-root", "app"]);
        let Command::AppDir { launch } = cli.command else {
            panic!("expected app-dir");
        };
        let err = launch_inputs(&launch).expect_err("missing deps");
        assert!(err.to_string().contains("--deps or --managed-app"));
    }

    #[test]
    fn text_output_has_one_line_per_path_list() {
        let mut output = ResolutionOutput::default();
        output.probe_paths.tpa = "a.dll".to_string();
        let text = render_text(&output);
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("tpa=a.dll\n"));
    }
}
