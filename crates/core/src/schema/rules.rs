//! Rule-based schema implementation.
//!
//! A [`RuleSchema`] is an ordered list of attribute declarations, each with an
//! [`AttributeRule`]. Schemas can be built in code or deserialized from JSON:
//!
//! ```json
//! {
//!   "name": "Widget",
//!   "attributes": [
//!     { "name": "id", "type": "string", "required": true, "min_len": 1 },
//!     { "name": "price", "type": "number", "min": 0 },
//!     { "name": "tags", "type": "list", "nullable": true }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::Attributes;

use super::{Schema, SchemaError, ValidationError};

/// The type an attribute value must have, with optional bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_len: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_len: Option<usize>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Boolean,
    List,
    Map,
    Any,
}

impl AttributeKind {
    /// Returns every violation of this kind by a present, non-null value.
    fn check(&self, value: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            AttributeKind::String { min_len, max_len } => match value.as_str() {
                Some(s) => {
                    let len = s.chars().count();
                    if let Some(min) = min_len.filter(|min| len < *min) {
                        errors.push(format!("must be at least {min} characters"));
                    }
                    if let Some(max) = max_len.filter(|max| len > *max) {
                        errors.push(format!("must be at most {max} characters"));
                    }
                }
                None => errors.push("must be a string".to_string()),
            },
            AttributeKind::Number { min, max } => match value.as_f64() {
                Some(n) => push_bounds(&mut errors, n, *min, *max),
                None => errors.push("must be a number".to_string()),
            },
            AttributeKind::Integer { min, max } => match value.as_f64() {
                Some(n) => {
                    if !is_integral(value) {
                        errors.push("must be an integer".to_string());
                    }
                    push_bounds(&mut errors, n, min.map(|m| m as f64), max.map(|m| m as f64));
                }
                None => errors.push("must be a number".to_string()),
            },
            AttributeKind::Boolean => {
                if !value.is_boolean() {
                    errors.push("must be a boolean".to_string());
                }
            }
            AttributeKind::List => {
                if !value.is_array() {
                    errors.push("must be a list".to_string());
                }
            }
            AttributeKind::Map => {
                if !value.is_object() {
                    errors.push("must be a map".to_string());
                }
            }
            AttributeKind::Any => {}
        }
        errors
    }
}

fn push_bounds(errors: &mut Vec<String>, n: f64, min: Option<f64>, max: Option<f64>) {
    if let Some(min) = min.filter(|min| n < *min) {
        errors.push(format!("must be at least {min}"));
    }
    if let Some(max) = max.filter(|max| n > *max) {
        errors.push(format!("must be at most {max}"));
    }
}

/// Validation rule for a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
    #[serde(flatten)]
    pub kind: AttributeKind,
    /// The attribute must be present.
    #[serde(default)]
    pub required: bool,
    /// A present `null` is accepted.
    #[serde(default)]
    pub nullable: bool,
}

impl AttributeRule {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeKind::String {
            min_len: None,
            max_len: None,
        })
    }

    pub fn number() -> Self {
        Self::new(AttributeKind::Number {
            min: None,
            max: None,
        })
    }

    pub fn integer() -> Self {
        Self::new(AttributeKind::Integer {
            min: None,
            max: None,
        })
    }

    pub fn boolean() -> Self {
        Self::new(AttributeKind::Boolean)
    }

    pub fn list() -> Self {
        Self::new(AttributeKind::List)
    }

    pub fn map() -> Self {
        Self::new(AttributeKind::Map)
    }

    pub fn any() -> Self {
        Self::new(AttributeKind::Any)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns every violation of this rule. Empty means valid.
    pub fn check(&self, value: Option<&Value>) -> Vec<String> {
        match value {
            None if self.required => vec!["is required".to_string()],
            None => Vec::new(),
            Some(Value::Null) if self.nullable => Vec::new(),
            Some(Value::Null) => vec!["must not be null".to_string()],
            Some(value) => self.kind.check(value),
        }
    }
}

/// Whole numbers, including `u64` values past `i64::MAX` and floats like `3.0`.
fn is_integral(value: &Value) -> bool {
    value.as_i64().is_some()
        || value.as_u64().is_some()
        || value.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0)
}

/// An ordered set of attribute rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDefinition", into = "SchemaDefinition")]
pub struct RuleSchema {
    name: String,
    names: Vec<String>,
    rules: Vec<AttributeRule>,
}

impl RuleSchema {
    /// Builds a schema from `(attribute, rule)` pairs in declaration order.
    pub fn new<I, N>(name: impl Into<String>, attributes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (N, AttributeRule)>,
        N: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut rules = Vec::new();
        for (attribute, rule) in attributes {
            let attribute = attribute.into();
            if attribute.is_empty() {
                return Err(SchemaError::EmptyAttributeName);
            }
            if !seen.insert(attribute.clone()) {
                return Err(SchemaError::DuplicateAttribute(attribute));
            }
            names.push(attribute);
            rules.push(rule);
        }

        Ok(Self { name, names, rules })
    }

    /// Gets the rule declared for an attribute.
    pub fn rule(&self, attribute: &str) -> Option<&AttributeRule> {
        self.names
            .iter()
            .position(|name| name == attribute)
            .map(|index| &self.rules[index])
    }
}

impl Schema for RuleSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute_names(&self) -> &[String] {
        &self.names
    }

    fn validate(&self, candidate: &Attributes) -> Result<(), ValidationError> {
        for (name, rule) in self.names.iter().zip(&self.rules) {
            let value = candidate.get(name);
            let errors = rule.check(value);
            if !errors.is_empty() {
                return Err(ValidationError::new(name.clone(), errors, value.cloned()));
            }
        }
        Ok(())
    }
}

/// Serialized form of a [`RuleSchema`].
#[derive(Serialize, Deserialize)]
struct SchemaDefinition {
    name: String,
    attributes: Vec<AttributeDefinition>,
}

#[derive(Serialize, Deserialize)]
struct AttributeDefinition {
    name: String,
    #[serde(flatten)]
    rule: AttributeRule,
}

impl TryFrom<SchemaDefinition> for RuleSchema {
    type Error = SchemaError;

    fn try_from(definition: SchemaDefinition) -> Result<Self, Self::Error> {
        RuleSchema::new(
            definition.name,
            definition
                .attributes
                .into_iter()
                .map(|attribute| (attribute.name, attribute.rule)),
        )
    }
}

impl From<RuleSchema> for SchemaDefinition {
    fn from(schema: RuleSchema) -> Self {
        SchemaDefinition {
            name: schema.name,
            attributes: schema
                .names
                .into_iter()
                .zip(schema.rules)
                .map(|(name, rule)| AttributeDefinition { name, rule })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget_schema() -> RuleSchema {
        RuleSchema::new(
            "Widget",
            [
                (
                    "id",
                    AttributeRule::new(AttributeKind::String {
                        min_len: Some(1),
                        max_len: None,
                    })
                    .required(),
                ),
                (
                    "quantity",
                    AttributeRule::new(AttributeKind::Integer {
                        min: Some(0),
                        max: Some(1000),
                    }),
                ),
                ("price", AttributeRule::number()),
                ("tags", AttributeRule::list().nullable()),
            ],
        )
        .unwrap()
    }

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_attribute_names_keep_declaration_order() {
        let schema = widget_schema();
        assert_eq!(
            schema.attribute_names(),
            &["id", "quantity", "price", "tags"]
        );
        assert!(schema.declares("price"));
        assert!(!schema.declares("color"));
    }

    #[test]
    fn test_valid_candidate_passes() {
        let schema = widget_schema();
        let candidate = attrs(json!({"id": "w-1", "quantity": 3, "price": 9.5, "tags": null}));
        assert!(schema.validate(&candidate).is_ok());
    }

    #[test]
    fn test_absent_optional_attributes_pass() {
        let schema = widget_schema();
        assert!(schema.validate(&attrs(json!({"id": "w-1"}))).is_ok());
    }

    #[test]
    fn test_missing_required_attribute() {
        let schema = widget_schema();
        let error = schema.validate(&attrs(json!({"price": 1}))).unwrap_err();
        assert_eq!(error.name, "id");
        assert_eq!(error.errors, vec!["is required"]);
        assert_eq!(error.value, None);
    }

    #[test]
    fn test_stops_at_first_invalid_attribute() {
        let schema = widget_schema();
        let candidate = attrs(json!({"id": "w-1", "quantity": "many", "price": "free"}));
        let error = schema.validate(&candidate).unwrap_err();
        assert_eq!(error.name, "quantity");
        assert_eq!(error.errors, vec!["must be a number"]);
        assert_eq!(error.value, Some(json!("many")));
    }

    #[test]
    fn test_reports_every_violation_of_one_attribute() {
        let schema = widget_schema();
        let candidate = attrs(json!({"id": "w-1", "quantity": -0.5}));
        let error = schema.validate(&candidate).unwrap_err();
        assert_eq!(error.name, "quantity");
        assert_eq!(error.errors, vec!["must be an integer", "must be at least 0"]);
    }

    #[test]
    fn test_integer_accepts_whole_numbers_of_any_representation() {
        let rule = AttributeRule::integer();
        let parsed: Value = serde_json::from_str("3.0").unwrap();

        assert!(rule.check(Some(&json!(3))).is_empty());
        assert!(rule.check(Some(&json!(3.0))).is_empty());
        assert!(rule.check(Some(&parsed)).is_empty());
        assert!(rule.check(Some(&json!(u64::MAX))).is_empty());
        assert_eq!(rule.check(Some(&json!(3.5))), vec!["must be an integer"]);
    }

    #[test]
    fn test_null_rejected_unless_nullable() {
        let schema = widget_schema();
        let error = schema
            .validate(&attrs(json!({"id": "w-1", "price": null})))
            .unwrap_err();
        assert_eq!(error.name, "price");
        assert_eq!(error.errors, vec!["must not be null"]);
    }

    #[test]
    fn test_string_length_bounds() {
        let rule = AttributeRule::new(AttributeKind::String {
            min_len: Some(2),
            max_len: Some(3),
        });
        assert_eq!(rule.check(Some(&json!("a"))), vec!["must be at least 2 characters"]);
        assert_eq!(rule.check(Some(&json!("abcd"))), vec!["must be at most 3 characters"]);
        assert!(rule.check(Some(&json!("abc"))).is_empty());
    }

    #[test]
    fn test_kind_mismatches() {
        assert_eq!(AttributeRule::boolean().check(Some(&json!(1))), vec!["must be a boolean"]);
        assert_eq!(AttributeRule::map().check(Some(&json!([]))), vec!["must be a map"]);
        assert!(AttributeRule::any().check(Some(&json!({"a": 1}))).is_empty());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let result = RuleSchema::new(
            "Widget",
            [("id", AttributeRule::string()), ("id", AttributeRule::number())],
        );
        assert_eq!(
            result.unwrap_err(),
            SchemaError::DuplicateAttribute("id".to_string())
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = RuleSchema::new("  ", Vec::<(String, AttributeRule)>::new());
        assert_eq!(result.unwrap_err(), SchemaError::EmptyName);
    }

    #[test]
    fn test_deserialize_from_json_definition() {
        let schema: RuleSchema = serde_json::from_value(json!({
            "name": "Widget",
            "attributes": [
                {"name": "id", "type": "string", "required": true, "min_len": 1},
                {"name": "price", "type": "number", "min": 0},
                {"name": "tags", "type": "list", "nullable": true}
            ]
        }))
        .unwrap();

        assert_eq!(schema.name(), "Widget");
        assert_eq!(schema.attribute_names(), &["id", "price", "tags"]);
        assert!(schema.rule("id").unwrap().required);
        assert!(schema.rule("tags").unwrap().nullable);
        assert_eq!(
            schema.rule("price").unwrap().kind,
            AttributeKind::Number {
                min: Some(0.0),
                max: None
            }
        );
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let result: Result<RuleSchema, _> = serde_json::from_value(json!({
            "name": "Widget",
            "attributes": [
                {"name": "id", "type": "string"},
                {"name": "id", "type": "string"}
            ]
        }));
        assert!(result.is_err());
    }
}
