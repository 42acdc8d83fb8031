//! I/O helpers for the resolver.

pub mod additional_deps;
pub mod bundle;
pub mod config;
pub mod deps_json;
pub mod probe;
pub mod scan;
