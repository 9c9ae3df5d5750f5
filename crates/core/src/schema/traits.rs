use std::fmt::Debug;

use crate::storage::Attributes;

use super::ValidationError;

/// A named, ordered set of attribute declarations with a validating entry point.
pub trait Schema: Debug + Send + Sync {
    /// Name of the schema, used in log output.
    fn name(&self) -> &str;

    /// Declared attribute names, in declaration order.
    fn attribute_names(&self) -> &[String];

    /// Returns true if `name` is a declared attribute.
    fn declares(&self, name: &str) -> bool {
        self.attribute_names().iter().any(|declared| declared == name)
    }

    /// Validates a candidate attribute set.
    ///
    /// Stops at the first invalid attribute in declaration order and reports
    /// only that attribute.
    fn validate(&self, candidate: &Attributes) -> Result<(), ValidationError>;
}
