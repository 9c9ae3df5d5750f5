use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::schema::{Schema, ValidationError};
use crate::storage::Attributes;

/// A schema-validated attribute container.
///
/// Only attribute names declared by the schema are ever stored. Absent
/// attributes are simply not present; an explicit `null` is kept as
/// `Value::Null`.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<dyn Schema>,
    values: HashMap<String, Value>,
    validation_errors: Vec<ValidationError>,
}

impl Record {
    pub fn new(schema: Arc<dyn Schema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            validation_errors: Vec::new(),
        }
    }

    /// Creates a record and populates it with `values`.
    pub fn with_values<I>(schema: Arc<dyn Schema>, values: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut record = Self::new(schema);
        record.populate(values);
        record
    }

    pub fn schema(&self) -> &Arc<dyn Schema> {
        &self.schema
    }

    /// Assigns every declared attribute in `values`, overwriting prior values.
    ///
    /// Undeclared names are dropped without error.
    pub fn populate<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in values {
            self.set(name, value);
        }
        self
    }

    /// Sets a single attribute. Returns false when the schema does not declare it.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if !self.schema.declares(&name) {
            return false;
        }
        self.values.insert(name, value);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Removes an attribute, making it absent again.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// The set attributes, in schema declaration order.
    pub fn attributes(&self) -> Attributes {
        self.schema
            .attribute_names()
            .iter()
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Validates the current attributes, recording the first failure.
    ///
    /// Returns the recorded error when validation fails.
    pub fn check(&mut self) -> Result<(), ValidationError> {
        self.validation_errors.clear();
        match self.schema.validate(&self.attributes()) {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::debug!(
                    schema = self.schema.name(),
                    attribute = %error.name,
                    "Record failed validation"
                );
                self.validation_errors.push(error.clone());
                Err(error)
            }
        }
    }

    /// Validates the current attributes. See [`Record::check`].
    pub fn validate(&mut self) -> bool {
        self.check().is_ok()
    }

    /// Errors recorded by the last validation. Empty before any validation.
    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }
}
