use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use super::errors::ConversionError;
use super::platform::{PlatformAttributeValue, PlatformImage};
use super::value::{AttributeValue, Item};

// ============================================================================
// Record Normalizer
// ============================================================================
//
// Maps a change-log image onto canonical attribute values. The whole image is
// rejected on the first node that cannot be converted; nothing is skipped.
//
// ============================================================================

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$").expect("decimal grammar is valid")
});

/// Normalize one image. An absent image is the same as an empty one.
pub fn normalize(image: Option<&PlatformImage>) -> Result<Item, ConversionError> {
    let Some(image) = image else {
        return Ok(Item::new());
    };

    image
        .iter()
        .map(|(name, node)| convert(node, name).map(|value| (name.clone(), value)))
        .collect()
}

fn convert(node: &PlatformAttributeValue, path: &str) -> Result<AttributeValue, ConversionError> {
    // The null marker wins over whatever else the node carries
    if node.null == Some(true) {
        return Ok(AttributeValue::Null);
    }

    if let Some((tag, _)) = node.other.iter().find(|(_, value)| !value.is_null()) {
        return Err(ConversionError::UnknownTag {
            path: path.to_string(),
            tag: tag.clone(),
        });
    }

    let tags = populated_tags(node);
    if tags.is_empty() {
        return Err(ConversionError::MissingTag {
            path: path.to_string(),
        });
    }
    if tags.len() > 1 {
        return Err(ConversionError::AmbiguousTags {
            path: path.to_string(),
            tags,
        });
    }

    if let Some(s) = &node.s {
        return Ok(AttributeValue::String(s.clone()));
    }
    if let Some(n) = &node.n {
        return parse_number(n, path).map(AttributeValue::Number);
    }
    if let Some(b) = &node.b {
        return decode_binary(b, path).map(AttributeValue::Binary);
    }
    if let Some(flag) = node.boolean {
        return Ok(AttributeValue::Bool(flag));
    }
    if let Some(entries) = &node.m {
        let converted = entries
            .iter()
            .map(|(key, child)| {
                convert(child, &format!("{path}.{key}")).map(|value| (key.clone(), value))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        return Ok(AttributeValue::Map(converted));
    }
    if let Some(items) = &node.l {
        let converted = items
            .iter()
            .enumerate()
            .map(|(index, child)| convert(child, &format!("{path}[{index}]")))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AttributeValue::List(converted));
    }
    if let Some(strings) = &node.ss {
        return Ok(AttributeValue::StringSet(strings.iter().cloned().collect()));
    }
    if let Some(numbers) = &node.ns {
        let converted = numbers
            .iter()
            .map(|n| parse_number(n, path))
            .collect::<Result<BTreeSet<_>, _>>()?;
        return Ok(AttributeValue::NumberSet(converted));
    }
    if let Some(blobs) = &node.bs {
        let converted = blobs
            .iter()
            .map(|b| decode_binary(b, path))
            .collect::<Result<BTreeSet<_>, _>>()?;
        return Ok(AttributeValue::BinarySet(converted));
    }

    // populated_tags() covers exactly the branches above
    Err(ConversionError::MissingTag {
        path: path.to_string(),
    })
}

fn populated_tags(node: &PlatformAttributeValue) -> Vec<&'static str> {
    [
        ("S", node.s.is_some()),
        ("N", node.n.is_some()),
        ("B", node.b.is_some()),
        ("BOOL", node.boolean.is_some()),
        ("M", node.m.is_some()),
        ("L", node.l.is_some()),
        ("SS", node.ss.is_some()),
        ("NS", node.ns.is_some()),
        ("BS", node.bs.is_some()),
    ]
    .into_iter()
    .filter_map(|(tag, present)| present.then_some(tag))
    .collect()
}

fn parse_number(raw: &str, path: &str) -> Result<String, ConversionError> {
    // ASCII digits only, no padding
    if DECIMAL.is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(ConversionError::InvalidNumber {
            path: path.to_string(),
            value: raw.to_string(),
        })
    }
}

fn decode_binary(raw: &str, path: &str) -> Result<Vec<u8>, ConversionError> {
    STANDARD
        .decode(raw)
        .map_err(|source| ConversionError::InvalidBinary {
            path: path.to_string(),
            source,
        })
}

// ============================================================================
// Inverse mapping (canonical -> platform)
// ============================================================================

/// Render a canonical map back into the change-log tagged form.
pub fn denormalize(item: &Item) -> PlatformImage {
    item.iter()
        .map(|(name, value)| (name.clone(), to_platform(value)))
        .collect()
}

pub fn to_platform(value: &AttributeValue) -> PlatformAttributeValue {
    let mut node = PlatformAttributeValue::default();
    match value {
        AttributeValue::String(s) => node.s = Some(s.clone()),
        AttributeValue::Number(n) => node.n = Some(n.clone()),
        AttributeValue::Binary(bytes) => node.b = Some(STANDARD.encode(bytes)),
        AttributeValue::Bool(flag) => node.boolean = Some(*flag),
        AttributeValue::Null => node.null = Some(true),
        AttributeValue::Map(entries) => {
            node.m = Some(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), to_platform(child)))
                    .collect(),
            )
        }
        AttributeValue::List(items) => node.l = Some(items.iter().map(to_platform).collect()),
        AttributeValue::StringSet(items) => node.ss = Some(items.iter().cloned().collect()),
        AttributeValue::NumberSet(items) => node.ns = Some(items.iter().cloned().collect()),
        AttributeValue::BinarySet(items) => {
            node.bs = Some(items.iter().map(|bytes| STANDARD.encode(bytes)).collect())
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image(value: serde_json::Value) -> PlatformImage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_absent_and_empty_images_normalize_to_empty() {
        assert!(normalize(None).unwrap().is_empty());
        assert!(normalize(Some(&PlatformImage::new())).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_tags() {
        let item = normalize(Some(&image(json!({
            "name": { "S": "Sikt" },
            "count": { "N": "-12.50e3" },
            "active": { "BOOL": false },
            "blob": { "B": "aGk=" }
        }))))
        .unwrap();

        assert_eq!(item["name"], AttributeValue::String("Sikt".to_string()));
        assert_eq!(item["count"], AttributeValue::Number("-12.50e3".to_string()));
        assert_eq!(item["active"], AttributeValue::Bool(false));
        assert_eq!(item["blob"], AttributeValue::Binary(b"hi".to_vec()));
    }

    #[test]
    fn test_empty_list_is_not_null() {
        let item = normalize(Some(&image(json!({
            "claims": { "L": [] },
            "unset": { "NULL": true }
        }))))
        .unwrap();

        assert_eq!(item["claims"], AttributeValue::List(vec![]));
        assert_eq!(item["unset"], AttributeValue::Null);
    }

    #[test]
    fn test_null_marker_wins_over_other_fields() {
        let item = normalize(Some(&image(json!({
            "field": { "NULL": true, "S": "ignored", "L": [] }
        }))))
        .unwrap();

        assert_eq!(item["field"], AttributeValue::Null);
    }

    #[test]
    fn test_object_mapper_shape_with_empty_list() {
        let item = normalize(Some(&image(json!({
            "claims": { "s": null, "n": null, "nULL": null, "bOOL": null, "m": null, "l": [] }
        }))))
        .unwrap();

        assert_eq!(item["claims"], AttributeValue::List(vec![]));
    }

    #[test]
    fn test_sets_are_deduplicated() {
        let item = normalize(Some(&image(json!({
            "types": { "SS": ["b", "a", "b"] },
            "sizes": { "NS": ["2", "1"] }
        }))))
        .unwrap();

        assert_eq!(
            item["types"],
            AttributeValue::StringSet(["a", "b"].iter().map(|s| s.to_string()).collect())
        );
        assert_eq!(
            item["sizes"],
            AttributeValue::NumberSet(["1", "2"].iter().map(|s| s.to_string()).collect())
        );
    }

    #[test]
    fn test_malformed_number_reports_nested_path() {
        let err = normalize(Some(&image(json!({
            "channelClaims": { "L": [ { "M": { "weight": { "N": "12,5" } } } ] }
        }))))
        .unwrap_err();

        assert!(matches!(err, ConversionError::InvalidNumber { .. }));
        assert_eq!(err.path(), "channelClaims[0].weight");
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        for raw in ["NaN", "inf", "", "1.2.3", "e5", "١٢٣", " 12 ", "12\n"] {
            let result = normalize(Some(&image(json!({ "n": { "N": raw } }))));
            assert!(result.is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_unknown_tag_rejects_record() {
        let err = normalize(Some(&image(json!({ "odd": { "X": "1" } })))).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownTag { ref tag, .. } if tag == "X"));
    }

    #[test]
    fn test_node_without_tags_is_rejected() {
        let err = normalize(Some(&image(json!({ "empty": {} })))).unwrap_err();
        assert!(matches!(err, ConversionError::MissingTag { .. }));
    }

    #[test]
    fn test_two_tags_are_ambiguous() {
        let err = normalize(Some(&image(json!({ "both": { "S": "1", "N": "1" } })))).unwrap_err();
        assert!(matches!(err, ConversionError::AmbiguousTags { ref tags, .. } if tags == &vec!["S", "N"]));
    }

    #[test]
    fn test_round_trip_through_platform_form() {
        let original = normalize(Some(&image(json!({
            "id": { "S": "https://x/customer/1" },
            "n": { "N": "3.14" },
            "flag": { "BOOL": true },
            "nothing": { "NULL": true },
            "empty": { "L": [] },
            "blob": { "B": "AAEC" },
            "ss": { "SS": ["a"] },
            "ns": { "NS": ["7"] },
            "bs": { "BS": ["AAE="] },
            "nested": { "M": { "list": { "L": [ { "S": "x" }, { "L": [] }, { "NULL": true } ] } } }
        }))))
        .unwrap();

        let rendered = serde_json::to_value(denormalize(&original)).unwrap();
        let reparsed: PlatformImage = serde_json::from_value(rendered).unwrap();

        assert_eq!(normalize(Some(&reparsed)).unwrap(), original);
    }
}
