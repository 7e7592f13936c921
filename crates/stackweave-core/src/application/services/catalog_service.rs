//! Catalog Service - fragment catalog queries.
//!
//! Read-only view of the fragment store for listing and inspection.
//! Separated from ComposeService for single responsibility.

use serde::Serialize;

use crate::{
    application::ports::FragmentStore,
    domain::{DocumentKind, Fragment, FragmentId, OptionSet},
    error::StackweaveResult,
};

/// Information about a fragment for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentInfo {
    pub id: String,
    pub document: DocumentKind,
    pub description: String,
    /// Human-readable applicability (`always`, `db=postgres mode=development`).
    pub applies_when: String,
    pub specificity: u8,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
}

impl From<&Fragment> for FragmentInfo {
    fn from(f: &Fragment) -> Self {
        Self {
            id: f.id.to_string(),
            document: f.document,
            description: f.description.clone(),
            applies_when: f.matcher.to_string(),
            specificity: f.matcher.specificity(),
            provides: f.provided_symbols().map(str::to_string).collect(),
            requires: f.requires.clone(),
        }
    }
}

/// Service for catalog queries.
pub struct CatalogService {
    store: Box<dyn FragmentStore>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(store: Box<dyn FragmentStore>) -> Self {
        Self { store }
    }

    /// Every fragment, optionally restricted to one document.
    pub fn list(&self, document: Option<DocumentKind>) -> StackweaveResult<Vec<FragmentInfo>> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|f| document.is_none_or(|d| f.document == d))
            .map(FragmentInfo::from)
            .collect())
    }

    /// Get a fragment by id.
    pub fn get(&self, id: &FragmentId) -> StackweaveResult<FragmentInfo> {
        self.store.get(id).map(|f| FragmentInfo::from(&f))
    }

    /// The fragments selected for an option set.
    pub fn find(&self, options: &OptionSet) -> StackweaveResult<Vec<FragmentInfo>> {
        Ok(self
            .store
            .find(options)?
            .iter()
            .map(FragmentInfo::from)
            .collect())
    }
}
