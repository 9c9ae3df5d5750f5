use std::sync::Arc;

use serde_json::Value;

use crate::naming::TableNaming;
use crate::schema::Schema;
use crate::storage::Attributes;

use super::DefinitionError;

/// Table and primary key layout of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub table_name: String,
    pub partition_key_name: String,
    pub sort_key_name: Option<String>,
}

/// A concrete record type: its name, schema, and table layout.
///
/// Built once and shared behind an `Arc` by every record of the type.
#[derive(Debug, Clone)]
pub struct RecordDefinition {
    type_name: String,
    schema: Arc<dyn Schema>,
    keys: KeySchema,
}

impl RecordDefinition {
    pub fn builder(type_name: impl Into<String>, schema: Arc<dyn Schema>) -> RecordDefinitionBuilder {
        RecordDefinitionBuilder {
            type_name: type_name.into(),
            schema,
            partition_key: None,
            sort_key: None,
            table_name: None,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn schema(&self) -> &Arc<dyn Schema> {
        &self.schema
    }

    pub fn key_schema(&self) -> &KeySchema {
        &self.keys
    }

    pub fn table_name(&self) -> &str {
        &self.keys.table_name
    }

    /// Builds a primary key from key values.
    pub fn key_for(&self, partition_value: Value, sort_value: Option<Value>) -> Attributes {
        let mut key = Attributes::new();
        key.insert(self.keys.partition_key_name.clone(), partition_value);
        if let (Some(name), Some(value)) = (&self.keys.sort_key_name, sort_value) {
            key.insert(name.clone(), value);
        }
        key
    }

    /// Extracts the primary key from a set of attributes.
    ///
    /// Returns `None` when a key attribute is absent or null.
    pub fn key_of(&self, attributes: &Attributes) -> Option<Attributes> {
        let partition_value = present(attributes, &self.keys.partition_key_name)?;
        let sort_value = match &self.keys.sort_key_name {
            Some(name) => Some(present(attributes, name)?),
            None => None,
        };
        Some(self.key_for(partition_value, sort_value))
    }
}

fn present(attributes: &Attributes, name: &str) -> Option<Value> {
    attributes.get(name).filter(|value| !value.is_null()).cloned()
}

/// Builder for [`RecordDefinition`].
#[derive(Debug)]
pub struct RecordDefinitionBuilder {
    type_name: String,
    schema: Arc<dyn Schema>,
    partition_key: Option<String>,
    sort_key: Option<String>,
    table_name: Option<String>,
}

impl RecordDefinitionBuilder {
    pub fn partition_key(mut self, name: impl Into<String>) -> Self {
        self.partition_key = Some(name.into());
        self
    }

    pub fn sort_key(mut self, name: impl Into<String>) -> Self {
        self.sort_key = Some(name.into());
        self
    }

    /// Overrides the table name derived from [`TableNaming`].
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Validates the key layout against the schema and derives the table name.
    pub fn build(self, naming: &TableNaming) -> Result<RecordDefinition, DefinitionError> {
        let type_name = self.type_name.trim().to_string();
        if type_name.is_empty() {
            return Err(DefinitionError::EmptyTypeName);
        }

        let partition_key_name = self
            .partition_key
            .ok_or_else(|| DefinitionError::MissingPartitionKey(type_name.clone()))?;

        for attribute in std::iter::once(&partition_key_name).chain(self.sort_key.as_ref()) {
            if !self.schema.declares(attribute) {
                return Err(DefinitionError::UndeclaredKey {
                    type_name,
                    attribute: attribute.clone(),
                });
            }
        }

        let table_name = self
            .table_name
            .unwrap_or_else(|| naming.table_name(&type_name));
        if table_name.trim().is_empty() {
            return Err(DefinitionError::EmptyTableName(type_name));
        }

        Ok(RecordDefinition {
            type_name,
            schema: self.schema,
            keys: KeySchema {
                table_name,
                partition_key_name,
                sort_key_name: self.sort_key,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeRule, RuleSchema};
    use serde_json::json;

    fn schema() -> Arc<dyn Schema> {
        Arc::new(
            RuleSchema::new(
                "Order",
                [
                    ("customer", AttributeRule::string().required()),
                    ("placed_at", AttributeRule::string().required()),
                    ("total", AttributeRule::number()),
                ],
            )
            .unwrap(),
        )
    }

    fn naming() -> TableNaming {
        TableNaming::new(Some("MyProject".to_string()), Some("MyStage".to_string()))
    }

    #[test]
    fn test_build_derives_table_name() {
        let definition = RecordDefinition::builder("Order", schema())
            .partition_key("customer")
            .build(&naming())
            .unwrap();

        assert_eq!(definition.table_name(), "MyProject-MyStage-Order");
        assert_eq!(definition.key_schema().partition_key_name, "customer");
        assert_eq!(definition.key_schema().sort_key_name, None);
    }

    #[test]
    fn test_build_with_table_override() {
        let definition = RecordDefinition::builder("Order", schema())
            .partition_key("customer")
            .table_name("legacy-orders")
            .build(&naming())
            .unwrap();

        assert_eq!(definition.table_name(), "legacy-orders");
    }

    #[test]
    fn test_build_requires_partition_key() {
        let result = RecordDefinition::builder("Order", schema()).build(&naming());
        assert_eq!(
            result.unwrap_err(),
            DefinitionError::MissingPartitionKey("Order".to_string())
        );
    }

    #[test]
    fn test_build_rejects_undeclared_sort_key() {
        let result = RecordDefinition::builder("Order", schema())
            .partition_key("customer")
            .sort_key("created")
            .build(&naming());
        assert_eq!(
            result.unwrap_err(),
            DefinitionError::UndeclaredKey {
                type_name: "Order".to_string(),
                attribute: "created".to_string(),
            }
        );
    }

    #[test]
    fn test_build_rejects_empty_type_name() {
        let result = RecordDefinition::builder(" ", schema())
            .partition_key("customer")
            .build(&naming());
        assert_eq!(result.unwrap_err(), DefinitionError::EmptyTypeName);
    }

    #[test]
    fn test_key_for_composite_key() {
        let definition = RecordDefinition::builder("Order", schema())
            .partition_key("customer")
            .sort_key("placed_at")
            .build(&TableNaming::default())
            .unwrap();

        let key = definition.key_for(json!("c-1"), Some(json!("2024-06-01")));
        assert_eq!(
            Value::Object(key),
            json!({"customer": "c-1", "placed_at": "2024-06-01"})
        );

        let partial = definition.key_for(json!("c-1"), None);
        assert_eq!(Value::Object(partial), json!({"customer": "c-1"}));
    }

    #[test]
    fn test_key_of_requires_every_key_attribute() {
        let definition = RecordDefinition::builder("Order", schema())
            .partition_key("customer")
            .sort_key("placed_at")
            .build(&TableNaming::default())
            .unwrap();

        let mut attributes = Attributes::new();
        attributes.insert("customer".to_string(), json!("c-1"));
        attributes.insert("total".to_string(), json!(10));
        assert!(definition.key_of(&attributes).is_none());

        attributes.insert("placed_at".to_string(), json!("2024-06-01"));
        assert_eq!(
            definition.key_of(&attributes).map(Value::Object),
            Some(json!({"customer": "c-1", "placed_at": "2024-06-01"}))
        );
    }
}
