use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Canonical Attribute Value
// ============================================================================
//
// The storage-schema representation of one attribute. Every consumer matches
// on the variants directly; there is no converter registry.
//
// ============================================================================

/// An attribute map keyed by attribute name. Ordered so that iteration,
/// error reporting and serialization are deterministic.
pub type Item = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    /// Decimal number kept in its textual form
    Number(String),
    Binary(Vec<u8>),
    Bool(bool),
    Null,
    Map(BTreeMap<String, AttributeValue>),
    /// An empty list is a value in its own right and never collapses to `Null`
    List(Vec<AttributeValue>),
    StringSet(BTreeSet<String>),
    NumberSet(BTreeSet<String>),
    BinarySet(BTreeSet<Vec<u8>>),
}

impl AttributeValue {
    /// Plain JSON view of the value, used to bind attribute maps onto typed
    /// schema structs with serde.
    ///
    /// Sets become arrays in their sorted order, binary becomes standard
    /// base64 text.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::String(s) => Value::String(s.clone()),
            AttributeValue::Number(n) => n
                .parse::<Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(n.clone())),
            AttributeValue::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Null => Value::Null,
            AttributeValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            AttributeValue::List(items) => {
                Value::Array(items.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::StringSet(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            AttributeValue::NumberSet(items) => Value::Array(
                items
                    .iter()
                    .map(|n| AttributeValue::Number(n.clone()).to_json())
                    .collect(),
            ),
            AttributeValue::BinarySet(items) => Value::Array(
                items
                    .iter()
                    .map(|bytes| Value::String(STANDARD.encode(bytes)))
                    .collect(),
            ),
        }
    }
}

/// JSON object view of a whole attribute map.
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(
        item.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_list_and_null_stay_distinct_in_json() {
        assert_eq!(AttributeValue::List(vec![]).to_json(), json!([]));
        assert_eq!(AttributeValue::Null.to_json(), Value::Null);
    }

    #[test]
    fn test_nested_map_to_json() {
        let mut inner = BTreeMap::new();
        inner.insert("count".to_string(), AttributeValue::Number("42".to_string()));
        inner.insert(
            "tags".to_string(),
            AttributeValue::StringSet(["b".to_string(), "a".to_string()].into_iter().collect()),
        );

        let mut item = Item::new();
        item.insert("inner".to_string(), AttributeValue::Map(inner));
        item.insert("flag".to_string(), AttributeValue::Bool(true));

        assert_eq!(
            item_to_json(&item),
            json!({ "flag": true, "inner": { "count": 42, "tags": ["a", "b"] } })
        );
    }

    #[test]
    fn test_binary_is_base64() {
        assert_eq!(
            AttributeValue::Binary(b"hi".to_vec()).to_json(),
            json!("aGk=")
        );
    }
}
