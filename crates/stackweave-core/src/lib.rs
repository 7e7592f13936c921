//! stackweave core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for stackweave, a
//! composition engine that turns a handful of choices (database, cache,
//! environment, project metadata) into four container configuration documents
//! that agree with each other.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         stackweave-cli (CLI)            │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (ComposeService, CatalogService)      │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │     (Driven: FragmentStore, Filesystem) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stackweave-adapters (Infrastructure) │
//! │  (BuiltinStore, LocalFilesystem, etc)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (OptionSet, Fragment, Composer, Bundle) │
//! │             No I/O                      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stackweave_core::prelude::*;
//!
//! // 1. Describe what you want
//! let options = OptionSet::builder()
//!     .project_name("shop")
//!     .database(DatabaseKind::Postgres)
//!     .cache(true)
//!     .build()?;
//!
//! // 2. Use application service (with injected adapters)
//! let service = ComposeService::new(store, filesystem);
//! let bundle = service.compose(&options)?;
//! service.emit(&bundle, "./shop".as_ref(), false)?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CatalogService, ComposeService, FragmentInfo,
        ports::{Filesystem, FragmentStore},
    };
    pub use crate::domain::{
        Bundle, DatabaseKind, DocumentKind, EnvironmentMode, Fragment, FragmentCatalog,
        FragmentId, FragmentMatcher, OptionSet, Violation,
    };
    pub use crate::error::{StackweaveError, StackweaveResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
