//! Launch-time dependency probe resolution for layered framework applications.
//!
//! Given an application, the chain of shared frameworks it runs on and their
//! `*.deps.json` manifests, this crate computes what a runtime host needs to
//! start the execution engine: the trusted assembly list, the native and
//! resource probe directories, and the engine library path. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (entries, RID fallback, probe
//!   configuration, name comparison, versions). No I/O.
//! - **[`io`]**: Side-effecting operations (manifest reading, existence checks,
//!   directory scans, bundle lookups, configuration files).
//!
//! Orchestration modules ([`chain`], [`validate`], [`resolve`]) combine the two
//! into the build → validate → resolve flow used by the `depsprobe` binary.

pub mod chain;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod resolve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
