//! The composed output: four documents and the table that produced them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{
    entities::{fragment::FragmentId, identifier_table::IdentifierTable},
    value_objects::DocumentKind,
};

/// The four rendered documents of one composition.
///
/// Always carries every [`DocumentKind`]; a document no fragment contributed
/// to is present and empty. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    documents: BTreeMap<DocumentKind, String>,
    identifiers: IdentifierTable,
    fragments: Vec<FragmentId>,
}

impl Bundle {
    /// Assemble a bundle, filling any missing document with empty text.
    pub fn new(
        mut documents: BTreeMap<DocumentKind, String>,
        identifiers: IdentifierTable,
        fragments: Vec<FragmentId>,
    ) -> Self {
        for kind in DocumentKind::ALL {
            documents.entry(kind).or_default();
        }
        Self {
            documents,
            identifiers,
            fragments,
        }
    }

    /// A bundle of documents that did not come from a composition (read back
    /// from disk, for example). It has no identifiers and no fragment trail.
    pub fn from_documents(documents: BTreeMap<DocumentKind, String>) -> Self {
        Self::new(documents, IdentifierTable::new(), Vec::new())
    }

    pub fn document(&self, kind: DocumentKind) -> &str {
        self.documents.get(&kind).map_or("", String::as_str)
    }

    /// Documents in [`DocumentKind`] order.
    pub fn documents(&self) -> impl Iterator<Item = (DocumentKind, &str)> {
        self.documents.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn identifiers(&self) -> &IdentifierTable {
        &self.identifiers
    }

    /// Ids of the fragments that produced this bundle, in application order.
    pub fn fragment_ids(&self) -> &[FragmentId] {
        &self.fragments
    }
}
