use crate::domain::{
    entities::{Bundle, Fragment, OptionSet},
    error::DomainError,
    validator::ConsistencyValidator,
};

/// Centralized domain validation.
///
/// One entry point per aggregate, so callers outside the domain do not need
/// to know where each rule lives.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_option_set(options: &OptionSet) -> Result<(), DomainError> {
        options.validate()
    }

    pub fn validate_fragment(fragment: &Fragment) -> Result<(), DomainError> {
        fragment.validate()
    }

    pub fn validate_bundle(bundle: &Bundle) -> Result<(), DomainError> {
        ConsistencyValidator::validate(bundle)
    }
}
