//! Key-condition and put-condition expressions understood by the in-memory store.
//!
//! Supported key conditions, with `#name` and `:value` placeholders:
//!
//! ```text
//! pk = :v
//! pk = :v AND sk (= | < | <= | > | >=) :v
//! pk = :v AND sk BETWEEN :a AND :b
//! pk = :v AND begins_with(sk, :prefix)
//! ```
//!
//! Supported put conditions: `attribute_exists(name)` and
//! `attribute_not_exists(name)`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use recordstore_core::storage::{Attributes, Item, StoreError};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A condition on one key attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Comparator, Value),
    Between(Value, Value),
    BeginsWith(String),
}

/// One `attribute <condition>` term of a key-condition expression.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTerm {
    pub attribute: String,
    pub condition: Condition,
}

impl KeyTerm {
    pub fn matches(&self, item: &Item) -> bool {
        let Some(value) = item.get(&self.attribute) else {
            return false;
        };
        match &self.condition {
            Condition::Compare(comparator, operand) => {
                match compare_values(value, operand) {
                    Some(ordering) => match comparator {
                        Comparator::Eq => ordering == Ordering::Equal,
                        Comparator::Lt => ordering == Ordering::Less,
                        Comparator::Le => ordering != Ordering::Greater,
                        Comparator::Gt => ordering == Ordering::Greater,
                        Comparator::Ge => ordering != Ordering::Less,
                    },
                    None => false,
                }
            }
            Condition::Between(low, high) => {
                matches!(
                    compare_values(value, low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    compare_values(value, high),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
            Condition::BeginsWith(prefix) => value
                .as_str()
                .is_some_and(|value| value.starts_with(prefix.as_str())),
        }
    }
}

/// Orders two key values: numbers numerically, strings lexicographically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A put condition on the existing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutCondition {
    AttributeExists(String),
    AttributeNotExists(String),
}

impl PutCondition {
    pub fn holds(&self, existing: Option<&Item>) -> bool {
        let present = |name: &str| existing.is_some_and(|item| item.contains_key(name));
        match self {
            PutCondition::AttributeExists(name) => present(name),
            PutCondition::AttributeNotExists(name) => !present(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Op(Comparator),
    Open,
    Close,
    Comma,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, StoreError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Op(Comparator::Eq));
            }
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if_eq(&'=').is_some();
                tokens.push(Token::Op(match (c, or_equal) {
                    ('<', false) => Comparator::Lt,
                    ('<', true) => Comparator::Le,
                    ('>', false) => Comparator::Gt,
                    _ => Comparator::Ge,
                }));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(c) = chars.next_if(|c| is_word_char(*c)) {
                    word.push(c);
                }
                tokens.push(Token::Word(word));
            }
            other => {
                return Err(invalid(format!(
                    "Invalid KeyConditionExpression: unexpected character '{other}'"
                )))
            }
        }
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | ':' | '.' | '-')
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidRequest(message.into())
}

struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    names: &'a BTreeMap<String, String>,
    values: &'a Attributes,
}

impl Parser<'_> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.tokens.get(self.position), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn expect(&mut self, expected: Token) -> Result<(), StoreError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(invalid(format!(
                "Invalid expression: expected {expected:?}, found {other:?}"
            ))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), StoreError> {
        if self.peek_keyword(keyword) {
            self.position += 1;
            Ok(())
        } else {
            Err(invalid(format!("Invalid expression: expected {keyword}")))
        }
    }

    fn word(&mut self) -> Result<String, StoreError> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            other => Err(invalid(format!(
                "Invalid expression: expected a name, found {other:?}"
            ))),
        }
    }

    /// Reads an attribute name, resolving `#placeholder` names.
    fn name(&mut self) -> Result<String, StoreError> {
        let word = self.word()?;
        if word.starts_with('#') {
            return self.names.get(&word).cloned().ok_or_else(|| {
                invalid(format!(
                    "An expression attribute name used in the document path is not defined; attribute name: {word}"
                ))
            });
        }
        if word.starts_with(':') {
            return Err(invalid(format!("Invalid expression: {word} used as a name")));
        }
        Ok(word)
    }

    /// Reads a `:placeholder` operand and resolves its value.
    fn operand(&mut self) -> Result<Value, StoreError> {
        let word = self.word()?;
        if !word.starts_with(':') {
            return Err(invalid(format!(
                "Invalid expression: expected a value placeholder, found {word}"
            )));
        }
        self.values.get(&word).cloned().ok_or_else(|| {
            invalid(format!(
                "An expression attribute value used in expression is not defined; attribute value: {word}"
            ))
        })
    }

    fn term(&mut self) -> Result<KeyTerm, StoreError> {
        if self.peek_keyword("begins_with") {
            self.position += 1;
            self.expect(Token::Open)?;
            let attribute = self.name()?;
            self.expect(Token::Comma)?;
            let prefix = match self.operand()? {
                Value::String(prefix) => prefix,
                other => {
                    return Err(invalid(format!(
                        "Invalid expression: begins_with needs a string operand, got {other}"
                    )))
                }
            };
            self.expect(Token::Close)?;
            return Ok(KeyTerm {
                attribute,
                condition: Condition::BeginsWith(prefix),
            });
        }

        let attribute = self.name()?;
        if self.peek_keyword("between") {
            self.position += 1;
            let low = self.operand()?;
            self.expect_keyword("and")?;
            let high = self.operand()?;
            return Ok(KeyTerm {
                attribute,
                condition: Condition::Between(low, high),
            });
        }

        match self.next() {
            Some(Token::Op(comparator)) => Ok(KeyTerm {
                attribute,
                condition: Condition::Compare(comparator, self.operand()?),
            }),
            other => Err(invalid(format!(
                "Invalid expression: expected a comparison, found {other:?}"
            ))),
        }
    }

    fn finished(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

/// Parses a key-condition expression into one or two terms.
pub fn parse_key_condition(
    expression: &str,
    names: &BTreeMap<String, String>,
    values: &Attributes,
) -> Result<Vec<KeyTerm>, StoreError> {
    let mut parser = Parser {
        tokens: tokenize(expression)?,
        position: 0,
        names,
        values,
    };

    let mut terms = vec![parser.term()?];
    if parser.peek_keyword("and") {
        parser.position += 1;
        terms.push(parser.term()?);
    }
    if !parser.finished() {
        return Err(invalid(format!(
            "Invalid KeyConditionExpression: unexpected trailing input in '{expression}'"
        )));
    }
    Ok(terms)
}

/// Parses an `attribute_exists(..)` / `attribute_not_exists(..)` condition.
pub fn parse_put_condition(
    expression: &str,
    names: &BTreeMap<String, String>,
) -> Result<PutCondition, StoreError> {
    let values = Attributes::new();
    let mut parser = Parser {
        tokens: tokenize(expression)?,
        position: 0,
        names,
        values: &values,
    };

    let function = parser.word()?;
    parser.expect(Token::Open)?;
    let attribute = parser.name()?;
    parser.expect(Token::Close)?;
    if !parser.finished() {
        return Err(invalid(format!(
            "Unsupported ConditionExpression: '{expression}'"
        )));
    }

    match function.to_ascii_lowercase().as_str() {
        "attribute_exists" => Ok(PutCondition::AttributeExists(attribute)),
        "attribute_not_exists" => Ok(PutCondition::AttributeNotExists(attribute)),
        _ => Err(invalid(format!(
            "Unsupported ConditionExpression function: {function}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn no_names() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_parse_partition_only() {
        let terms =
            parse_key_condition("id = :id", &no_names(), &values(json!({":id": "w-1"}))).unwrap();
        assert_eq!(
            terms,
            vec![KeyTerm {
                attribute: "id".to_string(),
                condition: Condition::Compare(Comparator::Eq, json!("w-1")),
            }]
        );
    }

    #[test]
    fn test_parse_between_with_name_placeholder() {
        let names = BTreeMap::from([("#ts".to_string(), "timestamp".to_string())]);
        let terms = parse_key_condition(
            "sensor = :s AND #ts BETWEEN :from AND :to",
            &names,
            &values(json!({":s": "s-1", ":from": 10, ":to": 20})),
        )
        .unwrap();

        assert_eq!(terms.len(), 2);
        assert_eq!(terms[1].attribute, "timestamp");
        assert_eq!(terms[1].condition, Condition::Between(json!(10), json!(20)));
    }

    #[test]
    fn test_parse_begins_with() {
        let terms = parse_key_condition(
            "pk = :pk and begins_with(sk, :prefix)",
            &no_names(),
            &values(json!({":pk": "p", ":prefix": "ORDER#"})),
        )
        .unwrap();
        assert_eq!(terms[1].condition, Condition::BeginsWith("ORDER#".to_string()));
    }

    #[test]
    fn test_parse_comparators() {
        let vals = values(json!({":pk": "p", ":v": 5}));
        for (expression, comparator) in [
            ("pk = :pk AND sk < :v", Comparator::Lt),
            ("pk = :pk AND sk <= :v", Comparator::Le),
            ("pk = :pk AND sk > :v", Comparator::Gt),
            ("pk = :pk AND sk >= :v", Comparator::Ge),
        ] {
            let terms = parse_key_condition(expression, &no_names(), &vals).unwrap();
            assert_eq!(terms[1].condition, Condition::Compare(comparator, json!(5)));
        }
    }

    #[test]
    fn test_undefined_value_placeholder() {
        let result = parse_key_condition("id = :missing", &no_names(), &Attributes::new());
        assert!(matches!(result, Err(StoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_undefined_name_placeholder() {
        let result = parse_key_condition("#id = :id", &no_names(), &values(json!({":id": 1})));
        assert!(matches!(result, Err(StoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_trailing_input_rejected() {
        let vals = values(json!({":a": 1, ":b": 2, ":c": 3}));
        let result = parse_key_condition("a = :a AND b = :b AND c = :c", &no_names(), &vals);
        assert!(matches!(result, Err(StoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_term_matching() {
        let item = values(json!({"sk": "ORDER#2024", "n": 7}));
        let term = |attribute: &str, condition| KeyTerm {
            attribute: attribute.to_string(),
            condition,
        };

        assert!(term("sk", Condition::BeginsWith("ORDER#".to_string())).matches(&item));
        assert!(term("n", Condition::Between(json!(7), json!(9))).matches(&item));
        assert!(term("n", Condition::Compare(Comparator::Le, json!(7))).matches(&item));
        assert!(!term("n", Condition::Compare(Comparator::Lt, json!(7))).matches(&item));
        assert!(!term("n", Condition::Compare(Comparator::Eq, json!("7"))).matches(&item));
        assert!(!term("missing", Condition::Compare(Comparator::Eq, json!(1))).matches(&item));
    }

    #[test]
    fn test_parse_put_conditions() {
        let names = BTreeMap::from([("#id".to_string(), "id".to_string())]);
        assert_eq!(
            parse_put_condition("attribute_not_exists(#id)", &names).unwrap(),
            PutCondition::AttributeNotExists("id".to_string())
        );
        assert_eq!(
            parse_put_condition("attribute_exists(id)", &no_names()).unwrap(),
            PutCondition::AttributeExists("id".to_string())
        );
        assert!(parse_put_condition("size(id) > :n", &no_names()).is_err());
    }

    #[test]
    fn test_put_condition_holds() {
        let existing = values(json!({"id": "w-1"}));
        let not_exists = PutCondition::AttributeNotExists("id".to_string());
        assert!(not_exists.holds(None));
        assert!(!not_exists.holds(Some(&existing)));

        let exists = PutCondition::AttributeExists("id".to_string());
        assert!(exists.holds(Some(&existing)));
        assert!(!exists.holds(None));
    }
}
