//! Stable exit codes for `depsprobe` commands.

use crate::error::ResolveError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Bad arguments or configuration, or a missing or unreadable manifest.
pub const INVALID: i32 = 1;
/// A declared asset could not be found while missing assets are fatal.
pub const UNRESOLVED: i32 = 2;

/// Exit code reported for a resolver failure.
pub fn for_error(err: &ResolveError) -> i32 {
    match err {
        ResolveError::MissingManifest { .. } | ResolveError::InvalidManifest { .. } => INVALID,
        ResolveError::UnresolvedAsset { .. } => UNRESOLVED,
    }
}
