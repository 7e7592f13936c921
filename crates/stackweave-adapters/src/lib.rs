//! Infrastructure adapters for stackweave.
//!
//! This crate implements the ports defined in `stackweave-core::application::ports`
//! and ships the built-in fragment catalog. It contains all I/O operations.

pub mod builtin_catalog;
pub mod filesystem;
pub mod fragment_store;

// Re-export commonly used adapters
pub use builtin_catalog::builtin_catalog;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use fragment_store::BuiltinStore;
