//! Fragments: the catalog's unit of composition.
//!
//! A fragment is a piece of one document plus the identifiers it binds and
//! the identifiers it expects someone earlier in the catalog to have bound.
//! Whether a fragment is selected for an option set is decided by its
//! [`FragmentMatcher`], an explicit record rather than an opaque closure, so
//! the catalog can be listed, filtered and checked for mandatory entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::{option_set::OptionSet, placeholder},
    error::DomainError,
    value_objects::{DatabaseKind, DocumentKind, EnvironmentMode},
};

// ============================================================================
// Fragment Identity
// ============================================================================

/// Stable, human-readable fragment identifier (`compose-app-db-env`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(String);

impl FragmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FragmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Template Source
// ============================================================================

/// Fragment text, either compiled in or built at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Compile-time string literal.
    Static(&'static str),

    /// Runtime-owned string.
    Owned(String),
}

impl From<&'static str> for TemplateSource {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

impl From<String> for TemplateSource {
    fn from(s: String) -> Self {
        Self::Owned(s)
    }
}

impl TemplateSource {
    /// Get string slice regardless of storage type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Static(s) => s,
            Self::Owned(s) => s,
        }
    }

    /// Symbols referenced by `{{symbol}}` placeholders.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholder::placeholders(self.as_str())
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// How a bound identifier gets its value.
#[derive(Debug, Clone)]
pub enum BindingValue {
    /// Rendered against the identifiers bound so far.
    Template(TemplateSource),

    /// Computed from the option set alone.
    Derived(fn(&OptionSet) -> String),
}

/// One identifier a fragment provides.
#[derive(Debug, Clone)]
pub struct Binding {
    pub symbol: String,
    pub value: BindingValue,
}

impl Binding {
    /// Bind `symbol` to a template (a plain literal is a template too).
    pub fn template(symbol: impl Into<String>, value: impl Into<TemplateSource>) -> Self {
        Self {
            symbol: symbol.into(),
            value: BindingValue::Template(value.into()),
        }
    }

    /// Bind `symbol` to a value computed from the option set.
    pub fn derived(symbol: impl Into<String>, f: fn(&OptionSet) -> String) -> Self {
        Self {
            symbol: symbol.into(),
            value: BindingValue::Derived(f),
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Which database choices a fragment answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseSelector {
    /// Exactly this kind (including `none`).
    Is(DatabaseKind),
    /// Any kind that runs a database container.
    AnyEngine,
}

impl DatabaseSelector {
    pub fn matches(self, kind: DatabaseKind) -> bool {
        match self {
            Self::Is(k) => k == kind,
            Self::AnyEngine => kind.is_engine(),
        }
    }
}

impl fmt::Display for DatabaseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Is(k) => write!(f, "{k}"),
            Self::AnyEngine => f.write_str("any"),
        }
    }
}

/// A named extra condition for cases the record fields cannot express.
#[derive(Clone, Copy)]
pub struct Predicate {
    pub name: &'static str,
    pub test: fn(&OptionSet) -> bool,
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// Applicability of a fragment.
///
/// ## Logic
///
/// For each field:
/// - `None` → matches (wildcard)
/// - `Some(x)` → must agree with the option set
///
/// All fields must match (AND logic), then the predicate, if any, must hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentMatcher {
    pub database: Option<DatabaseSelector>,
    pub cache: Option<bool>,
    pub mode: Option<EnvironmentMode>,
    pub predicate: Option<Predicate>,
}

impl FragmentMatcher {
    /// A matcher that selects its fragment for every option set.
    pub const fn always() -> Self {
        Self {
            database: None,
            cache: None,
            mode: None,
            predicate: None,
        }
    }

    pub fn builder() -> FragmentMatcherBuilder {
        FragmentMatcherBuilder::default()
    }

    pub fn matches(&self, options: &OptionSet) -> bool {
        self.database
            .is_none_or(|sel| sel.matches(options.database_kind()))
            && self.cache.is_none_or(|c| c == options.cache_enabled())
            && self.mode.is_none_or(|m| m == options.environment_mode())
            && self.predicate.is_none_or(|p| (p.test)(options))
    }

    /// Whether this matcher has no conditions at all.
    pub fn is_unconditional(&self) -> bool {
        self.specificity() == 0
    }

    /// Count of constrained fields (higher = more specific).
    pub fn specificity(&self) -> u8 {
        [
            self.database.is_some(),
            self.cache.is_some(),
            self.mode.is_some(),
            self.predicate.is_some(),
        ]
        .into_iter()
        .map(u8::from)
        .sum()
    }
}

impl fmt::Display for FragmentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unconditional() {
            return f.write_str("always");
        }
        let mut parts = Vec::new();
        if let Some(db) = self.database {
            parts.push(format!("db={db}"));
        }
        if let Some(cache) = self.cache {
            parts.push(format!("cache={}", if cache { "on" } else { "off" }));
        }
        if let Some(mode) = self.mode {
            parts.push(format!("mode={mode}"));
        }
        if let Some(p) = self.predicate {
            parts.push(format!("when {}", p.name));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Builder for [`FragmentMatcher`].
#[derive(Default)]
pub struct FragmentMatcherBuilder {
    inner: FragmentMatcher,
}

impl FragmentMatcherBuilder {
    pub fn database(mut self, kind: DatabaseKind) -> Self {
        self.inner.database = Some(DatabaseSelector::Is(kind));
        self
    }

    pub fn any_engine(mut self) -> Self {
        self.inner.database = Some(DatabaseSelector::AnyEngine);
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.inner.cache = Some(enabled);
        self
    }

    pub fn mode(mut self, mode: EnvironmentMode) -> Self {
        self.inner.mode = Some(mode);
        self
    }

    pub fn when(mut self, name: &'static str, test: fn(&OptionSet) -> bool) -> Self {
        self.inner.predicate = Some(Predicate { name, test });
        self
    }

    pub fn build(self) -> FragmentMatcher {
        self.inner
    }
}

// ============================================================================
// Fragment
// ============================================================================

/// A piece of one document, with the identifiers it provides and needs.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub id: FragmentId,
    pub document: DocumentKind,
    pub description: String,
    pub matcher: FragmentMatcher,
    pub provides: Vec<Binding>,
    pub requires: Vec<String>,
    pub body: TemplateSource,
}

impl Fragment {
    pub fn builder(id: impl Into<FragmentId>, document: DocumentKind) -> FragmentBuilder {
        FragmentBuilder {
            id: id.into(),
            document,
            description: String::new(),
            matcher: FragmentMatcher::always(),
            provides: Vec::new(),
            requires: Vec::new(),
            body: TemplateSource::Static(""),
        }
    }

    pub fn applies_to(&self, options: &OptionSet) -> bool {
        self.matcher.matches(options)
    }

    /// Symbols this fragment binds, in binding order.
    pub fn provided_symbols(&self) -> impl Iterator<Item = &str> {
        self.provides.iter().map(|b| b.symbol.as_str())
    }

    /// Lint the fragment.
    ///
    /// - the id is non-empty
    /// - every provided or required name is a well-formed symbol
    /// - no symbol is provided twice, or both provided and required
    /// - a binding template only references required symbols or symbols bound
    ///   earlier in this fragment
    /// - the body only references provided or required symbols
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidFragment {
            fragment: self.id.to_string(),
            reason,
        };

        if self.id.as_str().trim().is_empty() {
            return Err(invalid("fragment id cannot be empty".into()));
        }

        for name in &self.requires {
            if !placeholder::is_symbol(name) {
                return Err(invalid(format!("required name '{name}' is not a valid symbol")));
            }
        }

        let mut bound: Vec<&str> = Vec::with_capacity(self.provides.len());
        for binding in &self.provides {
            let symbol = binding.symbol.as_str();
            if !placeholder::is_symbol(symbol) {
                return Err(invalid(format!("provided name '{symbol}' is not a valid symbol")));
            }
            if bound.contains(&symbol) {
                return Err(invalid(format!("'{symbol}' is provided twice")));
            }
            if self.requires.iter().any(|r| r == symbol) {
                return Err(invalid(format!("'{symbol}' is both provided and required")));
            }
            if let BindingValue::Template(template) = &binding.value {
                for name in template.placeholders() {
                    let known = bound.contains(&name) || self.requires.iter().any(|r| r == name);
                    if !known {
                        return Err(invalid(format!(
                            "binding '{symbol}' references undeclared identifier '{name}'"
                        )));
                    }
                }
            }
            bound.push(symbol);
        }

        for name in self.body.placeholders() {
            let declared = bound.contains(&name) || self.requires.iter().any(|r| r == name);
            if !declared {
                return Err(invalid(format!(
                    "body references undeclared identifier '{name}'"
                )));
            }
        }

        Ok(())
    }
}

/// Builder for [`Fragment`].
pub struct FragmentBuilder {
    id: FragmentId,
    document: DocumentKind,
    description: String,
    matcher: FragmentMatcher,
    provides: Vec<Binding>,
    requires: Vec<String>,
    body: TemplateSource,
}

impl FragmentBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn matcher(mut self, matcher: FragmentMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Bind `symbol` to a template or literal.
    pub fn provides(mut self, symbol: impl Into<String>, value: impl Into<TemplateSource>) -> Self {
        self.provides.push(Binding::template(symbol, value));
        self
    }

    /// Bind `symbol` to a value computed from the option set.
    pub fn derives(mut self, symbol: impl Into<String>, f: fn(&OptionSet) -> String) -> Self {
        self.provides.push(Binding::derived(symbol, f));
        self
    }

    pub fn requires<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(symbols.into_iter().map(Into::into));
        self
    }

    pub fn body(mut self, body: impl Into<TemplateSource>) -> Self {
        self.body = body.into();
        self
    }

    /// Build and lint the fragment.
    pub fn build(self) -> Result<Fragment, DomainError> {
        let fragment = Fragment {
            id: self.id,
            document: self.document,
            description: self.description,
            matcher: self.matcher,
            provides: self.provides,
            requires: self.requires,
            body: self.body,
        };
        fragment.validate()?;
        Ok(fragment)
    }
}
