//! The symbol table a composition builds up as fragments are applied.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::domain::{entities::fragment::FragmentId, error::DomainError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct BoundIdentifier {
    value: String,
    fragment: FragmentId,
}

/// Resolved identifiers, keyed by symbol.
///
/// A symbol is bound at most once per composition. Binding it again to the
/// same value is a no-op; binding it to a different value is an
/// [`DomainError::IdentifierConflict`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierTable {
    entries: BTreeMap<String, BoundIdentifier>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value` on behalf of `fragment`.
    pub fn bind(
        &mut self,
        name: &str,
        value: String,
        fragment: &FragmentId,
    ) -> Result<(), DomainError> {
        if let Some(existing) = self.entries.get(name) {
            if existing.value == value {
                return Ok(());
            }
            return Err(DomainError::IdentifierConflict {
                name: name.to_string(),
                existing: existing.value.clone(),
                attempted: value,
                fragment: fragment.to_string(),
            });
        }

        self.entries.insert(
            name.to_string(),
            BoundIdentifier {
                value,
                fragment: fragment.clone(),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|e| e.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The fragment that first bound `name`.
    pub fn bound_by(&self, name: &str) -> Option<&FragmentId> {
        self.entries.get(name).map(|e| &e.fragment)
    }

    /// `(symbol, value)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for IdentifierTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_same_value_is_accepted() {
        let mut table = IdentifierTable::new();
        let a = FragmentId::from("a");
        let b = FragmentId::from("b");
        table.bind("app.port", "8000".into(), &a).unwrap();
        table.bind("app.port", "8000".into(), &b).unwrap();
        assert_eq!(table.get("app.port"), Some("8000"));
        assert_eq!(table.bound_by("app.port"), Some(&a));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rebinding_different_value_conflicts() {
        let mut table = IdentifierTable::new();
        table.bind("db.port", "5432".into(), &"env-postgres".into()).unwrap();
        let err = table
            .bind("db.port", "3306".into(), &"env-mysql".into())
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::IdentifierConflict {
                name: "db.port".into(),
                existing: "5432".into(),
                attempted: "3306".into(),
                fragment: "env-mysql".into(),
            }
        );
        assert_eq!(table.get("db.port"), Some("5432"));
    }

    #[test]
    fn iterates_in_symbol_order() {
        let mut table = IdentifierTable::new();
        let f = FragmentId::from("f");
        table.bind("z.last", "1".into(), &f).unwrap();
        table.bind("a.first", "2".into(), &f).unwrap();
        let keys: Vec<_> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a.first", "z.last"]);
    }
}
