//! Fragment store backed by an in-memory catalog.

use std::sync::Arc;

use stackweave_core::{
    application::{ApplicationError, ports::FragmentStore},
    domain::{Fragment, FragmentCatalog, FragmentId, OptionSet},
    error::StackweaveResult,
};
use tracing::debug;

use crate::builtin_catalog;

/// Thread-safe, read-only fragment store.
///
/// The catalog is validated once when the store is built and shared behind an
/// `Arc`, so clones are cheap.
#[derive(Debug, Clone)]
pub struct BuiltinStore {
    catalog: Arc<FragmentCatalog>,
}

impl BuiltinStore {
    /// Wrap an already validated catalog.
    pub fn new(catalog: FragmentCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Create a store holding the built-in catalog.
    pub fn with_builtin() -> StackweaveResult<Self> {
        let catalog = builtin_catalog::builtin_catalog()?;
        debug!(fragments = catalog.len(), "Built-in catalog loaded");
        Ok(Self::new(catalog))
    }

    /// Get the number of fragments.
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl FragmentStore for BuiltinStore {
    fn find(&self, options: &OptionSet) -> StackweaveResult<Vec<Fragment>> {
        Ok(self.catalog.lookup(options).into_iter().cloned().collect())
    }

    fn get(&self, id: &FragmentId) -> StackweaveResult<Fragment> {
        self.catalog.get(id).cloned().ok_or_else(|| {
            ApplicationError::FragmentNotFound { id: id.to_string() }.into()
        })
    }

    fn list(&self) -> StackweaveResult<Vec<Fragment>> {
        Ok(self.catalog.iter().cloned().collect())
    }
}
