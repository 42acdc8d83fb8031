//! Manifest validation for a framework chain.

use tracing::debug;

use crate::chain::FrameworkChain;
use crate::error::{ResolveError, Result};
use crate::io::deps_json::Manifest;

/// Proof that every manifest of a chain passed validation.
///
/// Only [`validate_chain`] builds one, and the resolver only accepts one.
#[derive(Clone, Copy)]
pub struct ValidatedChain<'c, 'a> {
    chain: &'c FrameworkChain<'a>,
}

impl<'c, 'a> ValidatedChain<'c, 'a> {
    pub fn chain(&self) -> &'c FrameworkChain<'a> {
        self.chain
    }
}

/// Check chain manifests (application first) and then additional manifests.
///
/// The application manifest may be absent; every framework manifest must
/// exist; every manifest that exists must parse. The first failure wins.
pub fn validate_chain<'c, 'a>(chain: &'c FrameworkChain<'a>) -> Result<ValidatedChain<'c, 'a>> {
    for (level, manifest) in chain.levels() {
        if !level.is_app() && !manifest.exists() {
            return Err(ResolveError::MissingManifest {
                path: manifest.path().to_path_buf(),
            });
        }
        ensure_parsed(manifest)?;
        debug!(level = %level, path = %manifest.path().display(), exists = manifest.exists(), "manifest ok");
    }
    for manifest in chain.additional_manifests() {
        ensure_parsed(manifest)?;
    }
    Ok(ValidatedChain { chain })
}

fn ensure_parsed(manifest: &Manifest) -> Result<()> {
    match manifest.invalid_reason() {
        None => Ok(()),
        Some(reason) => Err(ResolveError::InvalidManifest {
            path: manifest.path().to_path_buf(),
            reason: reason.to_string(),
        }),
    }
}
