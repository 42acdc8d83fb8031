//! Effective application directory for a launch mode.

use std::path::{MAIN_SEPARATOR, Path};

use crate::core::types::HostMode;

/// Application directory reported to the runtime.
///
/// `bundle_extraction_dir` is the extraction directory of a single-file bundle
/// running in backward-compatibility mode, if that is what the process is.
/// Embedded library hosts have no application directory and get `""`; every
/// other result ends with the platform directory separator.
pub fn effective_app_dir(
    host_mode: HostMode,
    app_root: &Path,
    bundle_extraction_dir: Option<&Path>,
) -> String {
    let dir = match (host_mode, bundle_extraction_dir) {
        (HostMode::Libhost, _) => return String::new(),
        (HostMode::Apphost, Some(extraction_dir)) => extraction_dir,
        _ => app_root,
    };
    let mut dir = dir.to_string_lossy().into_owned();
    if !dir.ends_with(MAIN_SEPARATOR) {
        dir.push(MAIN_SEPARATOR);
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn libhost_has_no_app_dir() {
        let dir = effective_app_dir(HostMode::Libhost, Path::new("/srv/app"), None);
        assert_eq!(dir, "");
    }

    #[test]
    fn app_dir_always_ends_with_separator() {
        let root = Path::new("srv").join("app");
        let dir = effective_app_dir(HostMode::Muxer, &root, None);
        assert!(dir.ends_with(MAIN_SEPARATOR));

        let already = format!("{}{MAIN_SEPARATOR}", root.display());
        let dir = effective_app_dir(HostMode::Muxer, Path::new(&already), None);
        assert_eq!(dir, already);
    }

    #[test]
    fn apphost_bundle_in_compat_mode_uses_extraction_dir() {
        let extraction = Path::new("tmp").join("extract");
        let dir = effective_app_dir(HostMode::Apphost, Path::new("app"), Some(&extraction));
        assert_eq!(dir, format!("{}{MAIN_SEPARATOR}", extraction.display()));
    }

    #[test]
    fn muxer_ignores_bundle_extraction_dir() {
        let dir = effective_app_dir(HostMode::Muxer, Path::new("app"), Some(Path::new("x")));
        assert_eq!(dir, format!("app{MAIN_SEPARATOR}"));
    }
}
