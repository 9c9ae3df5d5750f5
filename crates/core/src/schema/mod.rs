//! Schema capability consumed by records.
//!
//! Records never inspect attribute rules themselves. They ask a [`Schema`]
//! which names are declared and whether a candidate attribute set is valid.
//! [`RuleSchema`] is the bundled implementation; any other type-checking
//! mechanism can be plugged in by implementing the trait.

mod error;
mod rules;
mod traits;

pub use error::{SchemaError, ValidationError};
pub use rules::{AttributeKind, AttributeRule, RuleSchema};
pub use traits::Schema;
