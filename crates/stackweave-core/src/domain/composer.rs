//! The composer: turns an ordered fragment selection into a [`Bundle`].
//!
//! For each fragment, in order:
//!
//! 1. every required identifier must already be bound
//! 2. its bindings are evaluated and added to the table
//! 3. its body is rendered against the table
//!
//! Rendered bodies are appended to their document in the same order.
//! Composition is all-or-nothing: the first error aborts it and no partial
//! bundle escapes.

use std::collections::BTreeMap;

use crate::domain::{
    entities::{
        bundle::Bundle,
        fragment::{BindingValue, Fragment},
        identifier_table::IdentifierTable,
        option_set::OptionSet,
        placeholder,
    },
    error::DomainError,
    value_objects::DocumentKind,
};

/// Composes fragments for one option set.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    options: &'a OptionSet,
}

impl<'a> Composer<'a> {
    pub fn new(options: &'a OptionSet) -> Self {
        Self { options }
    }

    pub fn compose(&self, fragments: &[&Fragment]) -> Result<Bundle, DomainError> {
        let mut table = IdentifierTable::new();
        let mut documents: BTreeMap<DocumentKind, String> = BTreeMap::new();
        let mut trail = Vec::with_capacity(fragments.len());

        for fragment in fragments {
            let fragment_id = fragment.id.as_str();

            if let Some(missing) = fragment.requires.iter().find(|r| !table.contains(r)) {
                return Err(DomainError::UnresolvedIdentifier {
                    name: missing.clone(),
                    fragment: fragment_id.to_string(),
                });
            }

            for binding in &fragment.provides {
                let value = match &binding.value {
                    BindingValue::Template(template) => {
                        placeholder::render(template.as_str(), fragment_id, |name| {
                            table.get(name)
                        })?
                    }
                    BindingValue::Derived(derive) => derive(self.options),
                };
                table.bind(&binding.symbol, value, &fragment.id)?;
            }

            let rendered =
                placeholder::render(fragment.body.as_str(), fragment_id, |name| table.get(name))?;

            let text = documents.entry(fragment.document).or_default();
            text.push_str(&rendered);
            if !rendered.is_empty() && !rendered.ends_with('\n') {
                text.push('\n');
            }
            trail.push(fragment.id.clone());
        }

        Ok(Bundle::new(documents, table, trail))
    }
}
