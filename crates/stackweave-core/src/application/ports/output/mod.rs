//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stackweave-adapters` crate provides implementations.

use std::path::Path;

use crate::domain::{Fragment, FragmentId, OptionSet};
use crate::error::StackweaveResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stackweave_adapters::filesystem::LocalFilesystem` (production)
/// - `stackweave_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StackweaveResult<()>;

    /// Write content to a file, replacing it if present.
    fn write_file(&self, path: &Path, content: &str) -> StackweaveResult<()>;

    /// Read a whole file as UTF-8.
    fn read_file(&self, path: &Path) -> StackweaveResult<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> StackweaveResult<()>;
}

/// Port for fragment catalog access.
///
/// Implemented by:
/// - `stackweave_adapters::fragment_store::BuiltinStore` (compiled-in catalog)
///
/// Fragments are returned in catalog order; the composer relies on it.
#[cfg_attr(test, mockall::automock)]
pub trait FragmentStore: Send + Sync {
    /// All fragments that apply to an option set, in catalog order.
    fn find(&self, options: &OptionSet) -> StackweaveResult<Vec<Fragment>>;

    /// Get a specific fragment by id.
    fn get(&self, id: &FragmentId) -> StackweaveResult<Fragment>;

    /// List every fragment, in catalog order.
    fn list(&self) -> StackweaveResult<Vec<Fragment>>;
}
