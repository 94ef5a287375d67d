use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Platform Attribute Value - change-log notification format
// ============================================================================
//
// The change log delivers every attribute as an object keyed by a type tag:
//
//   {"S": "text"}   {"N": "12.5"}   {"NULL": true}   {"L": [...]}   {"M": {...}}
//
// Object-mapper serializations of the same record emit every tag on every
// node, with the unused ones set to null and the tag names in odd casing
// ("nULL", "bOOL", "sS"). Both shapes deserialize into this struct; deciding
// which tag is meaningful is the normalizer's job.
//
// ============================================================================

/// One image (old or new) of a change-log record.
pub type PlatformImage = BTreeMap<String, PlatformAttributeValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformAttributeValue {
    #[serde(rename = "S", alias = "s", default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,

    #[serde(rename = "N", alias = "n", default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Base64 encoded bytes
    #[serde(rename = "B", alias = "b", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,

    #[serde(
        rename = "BOOL",
        alias = "bOOL",
        alias = "bool",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub boolean: Option<bool>,

    #[serde(
        rename = "NULL",
        alias = "nULL",
        alias = "null",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub null: Option<bool>,

    #[serde(rename = "M", alias = "m", default, skip_serializing_if = "Option::is_none")]
    pub m: Option<BTreeMap<String, PlatformAttributeValue>>,

    #[serde(rename = "L", alias = "l", default, skip_serializing_if = "Option::is_none")]
    pub l: Option<Vec<PlatformAttributeValue>>,

    #[serde(
        rename = "SS",
        alias = "sS",
        alias = "ss",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ss: Option<Vec<String>>,

    #[serde(
        rename = "NS",
        alias = "nS",
        alias = "ns",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ns: Option<Vec<String>>,

    #[serde(
        rename = "BS",
        alias = "bS",
        alias = "bs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bs: Option<Vec<String>>,

    /// Keys that are not type tags
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_tagged_form() {
        let value: PlatformAttributeValue =
            serde_json::from_value(json!({ "L": [{ "S": "a" }, { "NULL": true }] })).unwrap();

        let items = value.l.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].s.as_deref(), Some("a"));
        assert_eq!(items[1].null, Some(true));
    }

    #[test]
    fn test_deserialize_object_mapper_form() {
        let value: PlatformAttributeValue = serde_json::from_value(json!({
            "s": null,
            "n": null,
            "nULL": null,
            "bOOL": null,
            "sS": ["x", "y"],
            "l": null
        }))
        .unwrap();

        assert_eq!(value.ss, Some(vec!["x".to_string(), "y".to_string()]));
        assert!(value.s.is_none());
        assert!(value.l.is_none());
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let value: PlatformAttributeValue =
            serde_json::from_value(json!({ "X": "mystery" })).unwrap();
        assert_eq!(value.other.get("X"), Some(&json!("mystery")));
    }

    #[test]
    fn test_serializes_only_populated_tags() {
        let value = PlatformAttributeValue {
            l: Some(vec![]),
            ..PlatformAttributeValue::default()
        };
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({ "L": [] }));
    }
}
