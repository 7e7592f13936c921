pub mod bundle;
pub mod catalog;
pub mod fragment;
pub mod identifier_table;
pub mod option_set;
pub mod placeholder;

pub use crate::domain::DomainError;
pub use bundle::Bundle;
pub use catalog::FragmentCatalog;
pub use fragment::{Fragment, FragmentId, FragmentMatcher};
pub use identifier_table::IdentifierTable;
pub use option_set::OptionSet;
