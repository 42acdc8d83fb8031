//! Deterministic, pure logic shared by the resolver.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod app_dir;
pub mod entry;
pub mod names;
pub mod probe;
pub mod rid;
pub mod types;
pub mod version;
