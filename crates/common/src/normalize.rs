//! Identity stripping for payload comparison
//!
//! Stored entities carry server-assigned `id` fields at every level. To compare
//! what was sent with what was stored, every mapping's `id` key is removed.
//! Optionally the outermost `id` is first checked against the identity the
//! caller expects.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{IdentityMismatch, Result};

const ID_KEY: &str = "id";

/// Return a copy of `value` with every mapping's `id` key removed
///
/// When `check_top_level_id` is set and `expected_id` is provided, the `id` of
/// the outermost mapping must equal `expected_id`. Nested mappings are never
/// checked. Elements of a sequence are normalized only when they are mappings.
pub fn remove_id_keys(
    value: &Value,
    expected_id: Option<i64>,
    check_top_level_id: bool,
) -> std::result::Result<Value, IdentityMismatch> {
    match value {
        Value::Object(map) => strip_map(map, expected_id, check_top_level_id).map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// Serialize `model` and strip its identity fields
pub fn strip_ids<T: Serialize>(
    model: &T,
    expected_id: Option<i64>,
    check_top_level_id: bool,
) -> Result<Value> {
    let value = serde_json::to_value(model)?;
    Ok(remove_id_keys(&value, expected_id, check_top_level_id)?)
}

fn strip_map(
    map: &Map<String, Value>,
    expected_id: Option<i64>,
    check_id: bool,
) -> std::result::Result<Map<String, Value>, IdentityMismatch> {
    let mut result = Map::with_capacity(map.len());

    for (key, value) in map {
        if key == ID_KEY {
            if let (true, Some(expected)) = (check_id, expected_id) {
                if value.as_i64() != Some(expected) {
                    return Err(IdentityMismatch {
                        expected,
                        actual: value.clone(),
                    });
                }
            }
            continue;
        }

        let stripped = match value {
            Value::Object(inner) => Value::Object(strip_map(inner, expected_id, false)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(inner) => strip_map(inner, expected_id, false).map(Value::Object),
                        other => Ok(other.clone()),
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            ),
            other => other.clone(),
        };
        result.insert(key.clone(), stripped);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> Value {
        json!({
            "id": 5,
            "title": "t",
            "verified": false,
            "addition": {"id": 9, "additional_info": "i", "additional_number": 1},
            "important_numbers": [1, 2, 3]
        })
    }

    #[test]
    fn test_strips_every_level() {
        let clean = remove_id_keys(&stored(), None, false).unwrap();
        assert_eq!(
            clean,
            json!({
                "title": "t",
                "verified": false,
                "addition": {"additional_info": "i", "additional_number": 1},
                "important_numbers": [1, 2, 3]
            })
        );
    }

    #[test]
    fn test_top_level_check_passes() {
        assert!(remove_id_keys(&stored(), Some(5), true).is_ok());
    }

    #[test]
    fn test_top_level_check_fails() {
        let err = remove_id_keys(&stored(), Some(6), true).unwrap_err();
        assert_eq!(err.expected, 6);
        assert_eq!(err.actual, json!(5));
        assert_eq!(err.to_string(), "Expected ID 6, but got 5");
    }

    #[test]
    fn test_check_is_skipped_without_flag_or_expected() {
        assert!(remove_id_keys(&stored(), Some(6), false).is_ok());
        assert!(remove_id_keys(&stored(), None, true).is_ok());
    }

    #[test]
    fn test_nested_ids_are_never_checked() {
        // addition.id == 9 and the nested list ids differ from expected, top-level matches
        let value = json!({
            "id": 5,
            "addition": {"id": 9},
            "children": [{"id": 10, "name": "a"}, {"id": 11, "name": "b"}]
        });
        let clean = remove_id_keys(&value, Some(5), true).unwrap();
        assert_eq!(
            clean,
            json!({"addition": {}, "children": [{"name": "a"}, {"name": "b"}]})
        );
    }

    #[test]
    fn test_missing_top_level_id_is_not_an_error() {
        let value = json!({"title": "x"});
        assert_eq!(remove_id_keys(&value, Some(1), true).unwrap(), value);
    }

    #[test]
    fn test_sequence_elements_that_are_not_mappings_pass_through() {
        let value = json!({"mixed": [1, "two", {"id": 3, "k": "v"}, [{"id": 4}]]});
        let clean = remove_id_keys(&value, None, false).unwrap();
        assert_eq!(clean, json!({"mixed": [1, "two", {"k": "v"}, [{"id": 4}]]}));
    }

    #[test]
    fn test_non_mapping_top_level_is_unchanged() {
        assert_eq!(remove_id_keys(&json!([{"id": 1}]), None, false).unwrap(), json!([{"id": 1}]));
        assert_eq!(remove_id_keys(&json!(3), Some(1), true).unwrap(), json!(3));
    }

    #[test]
    fn test_idempotent() {
        let once = remove_id_keys(&stored(), Some(5), true).unwrap();
        let twice = remove_id_keys(&once, Some(5), true).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_strip_ids_from_model() {
        let export = crate::types::ExportData {
            id: 1,
            title: "t".into(),
            verified: true,
            addition: crate::types::AdditionExport {
                id: 2,
                additional_info: "i".into(),
                additional_number: 3,
            },
            important_numbers: vec![4],
        };
        let clean = strip_ids(&export, Some(1), true).unwrap();
        assert!(clean.get("id").is_none());
        assert!(clean["addition"].get("id").is_none());
        assert!(matches!(
            strip_ids(&export, Some(2), true),
            Err(crate::error::Error::IdentityMismatch(_))
        ));
    }
}
