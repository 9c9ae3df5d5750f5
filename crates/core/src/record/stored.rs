use std::sync::Arc;

use serde_json::Value;

use crate::schema::ValidationError;
use crate::storage::{Attributes, Item};

use super::{KeySchema, Record, RecordDefinition};

/// A [`Record`] with persistence identity.
///
/// The table name comes from the definition unless overridden for this
/// instance with [`StoredRecord::with_table_name`].
#[derive(Debug, Clone)]
pub struct StoredRecord {
    record: Record,
    definition: Arc<RecordDefinition>,
    table_name: Option<String>,
}

impl StoredRecord {
    pub fn new(definition: Arc<RecordDefinition>) -> Self {
        Self {
            record: Record::new(Arc::clone(definition.schema())),
            definition,
            table_name: None,
        }
    }

    /// Creates a record populated from a stored item.
    pub fn from_item(definition: Arc<RecordDefinition>, item: Item) -> Self {
        let mut stored = Self::new(definition);
        stored.populate(item);
        stored
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn definition(&self) -> &Arc<RecordDefinition> {
        &self.definition
    }

    pub fn key_schema(&self) -> &KeySchema {
        self.definition.key_schema()
    }

    pub fn table_name(&self) -> &str {
        self.table_name
            .as_deref()
            .unwrap_or_else(|| self.definition.table_name())
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn populate<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.record.populate(values);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> bool {
        self.record.set(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    pub fn attributes(&self) -> Attributes {
        self.record.attributes()
    }

    pub fn check(&mut self) -> Result<(), ValidationError> {
        self.record.check()
    }

    pub fn validate(&mut self) -> bool {
        self.record.validate()
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        self.record.validation_errors()
    }

    pub fn partition_key_value(&self) -> Option<&Value> {
        self.get(&self.key_schema().partition_key_name)
    }

    pub fn sort_key_value(&self) -> Option<&Value> {
        self.key_schema()
            .sort_key_name
            .as_deref()
            .and_then(|name| self.get(name))
    }

    /// The primary key of this record, if every key attribute is set.
    pub fn key(&self) -> Option<Attributes> {
        self.definition.key_of(&self.attributes())
    }
}
