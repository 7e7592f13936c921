//! The fragment catalog: an ordered, validated collection of fragments.
//!
//! Order matters. The composer applies fragments in catalog order, so a
//! fragment that provides an identifier must come before every fragment that
//! requires it, and document text is concatenated in the same order.

use std::collections::HashSet;

use crate::domain::{
    entities::{
        fragment::{Fragment, FragmentId},
        option_set::OptionSet,
    },
    error::DomainError,
    value_objects::DocumentKind,
};

/// Documents that must always have at least one unconditional fragment.
pub const MANDATORY_DOCUMENTS: [DocumentKind; 2] = [
    DocumentKind::BuildDescriptor,
    DocumentKind::OrchestrationDescriptor,
];

/// An immutable, ordered set of fragments.
///
/// Construction fails on duplicate ids, on fragments that fail their own
/// lint, and when a mandatory document has no unconditional fragment.
#[derive(Debug, Clone)]
pub struct FragmentCatalog {
    fragments: Vec<Fragment>,
}

impl FragmentCatalog {
    pub fn new(fragments: Vec<Fragment>) -> Result<Self, DomainError> {
        let mut seen: HashSet<&FragmentId> = HashSet::with_capacity(fragments.len());
        for fragment in &fragments {
            fragment.validate()?;
            if !seen.insert(&fragment.id) {
                return Err(DomainError::DuplicateFragment {
                    fragment: fragment.id.to_string(),
                });
            }
        }

        for document in MANDATORY_DOCUMENTS {
            let covered = fragments
                .iter()
                .any(|f| f.document == document && f.matcher.is_unconditional());
            if !covered {
                return Err(DomainError::MissingMandatoryFragment { document });
            }
        }

        Ok(Self { fragments })
    }

    /// The fragments that apply to `options`, in catalog order.
    ///
    /// Deterministic and total: every valid option set gets an answer, and
    /// that answer always includes the mandatory fragments.
    pub fn lookup(&self, options: &OptionSet) -> Vec<&Fragment> {
        self.fragments
            .iter()
            .filter(|f| f.applies_to(options))
            .collect()
    }

    pub fn get(&self, id: &FragmentId) -> Option<&Fragment> {
        self.fragments.iter().find(|f| &f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
