//! Application layer for stackweave.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ComposeService, CatalogService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! composition logic itself. All composition rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    CatalogService,
    ComposeService,
    FragmentInfo, // DTO for fragment metadata
};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, FragmentStore};

pub use error::ApplicationError;
