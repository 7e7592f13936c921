//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "compose a bundle" or "list the catalog".

pub mod catalog_service;
pub mod compose_service;

pub use catalog_service::{CatalogService, FragmentInfo};
pub use compose_service::ComposeService;
