//! Error types for chain validation and probe resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal outcome of validating or resolving a framework chain.
///
/// The `Display` text is the message reported to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A framework's manifest is not on disk.
    #[error("A fatal error was encountered, missing dependencies manifest at: {}", .path.display())]
    MissingManifest { path: PathBuf },

    /// A manifest could not be read or parsed.
    #[error("An error occurred while parsing: {}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    /// A declared asset matched no probe configuration.
    #[error(
        "An assembly specified in the application dependencies manifest ({}) was not found:\n    package: '{library}', version: '{version}'\n    path: '{asset}'",
        .manifest.display()
    )]
    UnresolvedAsset {
        manifest: PathBuf,
        library: String,
        version: String,
        asset: String,
    },
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
