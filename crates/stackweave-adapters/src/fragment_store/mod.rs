//! Fragment store adapters.

mod builtin;

pub use builtin::BuiltinStore;
