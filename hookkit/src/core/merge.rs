//! Field-by-field merge of a user override into the default configuration.
//!
//! The default tree doubles as the schema: every override value must have the
//! same shape as the default it replaces. Values that do not match are dropped
//! individually and the default is kept for that field only.

use serde_json::{Map, Value};

/// A field from the override that was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Dotted path of the field (e.g. `guards.diffSize.maxLines`).
    pub path: String,
    pub reason: String,
}

/// Merge `overrides` onto a copy of `defaults`.
///
/// - Strings, booleans and string arrays must match the default's type.
///   Arrays replace the default wholesale.
/// - Integers must be non-negative JSON integers at or above the minimum
///   declared in `minimums` for that path (0 when absent).
/// - Objects recurse; unknown keys are ignored.
///
/// `defaults` is never modified. Returns the merged tree and every rejected
/// field.
pub fn merge_validated(
    defaults: &Value,
    overrides: &Value,
    minimums: &[(&str, u64)],
) -> (Value, Vec<Rejection>) {
    let mut rejections = Vec::new();
    let merged = match overrides.as_object() {
        Some(overrides) => merge_value(defaults, overrides, "", minimums, &mut rejections),
        None => {
            rejections.push(Rejection {
                path: String::new(),
                reason: "configuration must be a JSON object".to_string(),
            });
            defaults.clone()
        }
    };
    (merged, rejections)
}

fn merge_value(
    defaults: &Value,
    overrides: &Map<String, Value>,
    prefix: &str,
    minimums: &[(&str, u64)],
    rejections: &mut Vec<Rejection>,
) -> Value {
    let Some(default_obj) = defaults.as_object() else {
        return defaults.clone();
    };

    let mut out = Map::new();
    for (key, default_value) in default_obj {
        let path = join_path(prefix, key);
        let merged = match overrides.get(key) {
            None => default_value.clone(),
            Some(candidate) => {
                match accept(default_value, candidate, &path, minimums, rejections) {
                    Ok(value) => value,
                    Err(reason) => {
                        rejections.push(Rejection {
                            path: path.clone(),
                            reason,
                        });
                        default_value.clone()
                    }
                }
            }
        };
        out.insert(key.clone(), merged);
    }
    Value::Object(out)
}

fn accept(
    default_value: &Value,
    candidate: &Value,
    path: &str,
    minimums: &[(&str, u64)],
    rejections: &mut Vec<Rejection>,
) -> Result<Value, String> {
    match default_value {
        Value::Object(_) => match candidate.as_object() {
            Some(nested) => Ok(merge_value(default_value, nested, path, minimums, rejections)),
            None => Err(format!("expected object, got {}", type_name(candidate))),
        },
        Value::Bool(_) => match candidate {
            Value::Bool(_) => Ok(candidate.clone()),
            other => Err(format!("expected boolean, got {}", type_name(other))),
        },
        Value::String(_) => match candidate {
            Value::String(_) => Ok(candidate.clone()),
            other => Err(format!("expected string, got {}", type_name(other))),
        },
        Value::Number(_) => {
            let number = candidate.as_u64().ok_or_else(|| {
                format!("expected non-negative integer, got {}", type_name(candidate))
            })?;
            let min = minimum_for(path, minimums);
            if number < min {
                return Err(format!("{number} is below minimum {min}"));
            }
            Ok(candidate.clone())
        }
        Value::Array(_) => match candidate.as_array() {
            Some(items) if items.iter().all(Value::is_string) => Ok(candidate.clone()),
            Some(_) => Err("expected array of strings".to_string()),
            None => Err(format!("expected array, got {}", type_name(candidate))),
        },
        Value::Null => Err("field has no default shape".to_string()),
    }
}

fn minimum_for(path: &str, minimums: &[(&str, u64)]) -> u64 {
    minimums
        .iter()
        .find(|(field, _)| *field == path)
        .map(|(_, min)| *min)
        .unwrap_or(0)
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Value {
        json!({
            "name": "base",
            "guards": {
                "diffSize": {"enabled": true, "maxLines": 500},
                "paths": [".env"]
            },
            "limit": 0
        })
    }

    const MINIMUMS: &[(&str, u64)] = &[("guards.diffSize.maxLines", 1)];

    #[test]
    fn bad_field_falls_back_while_sibling_is_kept() {
        let overrides = json!({"guards": {"diffSize": {"enabled": false, "maxLines": "oops"}}});
        let (merged, rejections) = merge_validated(&defaults(), &overrides, MINIMUMS);

        assert_eq!(merged["guards"]["diffSize"]["maxLines"], json!(500));
        assert_eq!(merged["guards"]["diffSize"]["enabled"], json!(false));
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].path, "guards.diffSize.maxLines");
    }

    #[test]
    fn arrays_replace_wholesale() {
        let overrides = json!({"guards": {"paths": ["a", "b"]}});
        let (merged, rejections) = merge_validated(&defaults(), &overrides, MINIMUMS);
        assert_eq!(merged["guards"]["paths"], json!(["a", "b"]));
        assert!(rejections.is_empty());
    }

    #[test]
    fn arrays_with_non_strings_are_rejected() {
        let overrides = json!({"guards": {"paths": ["a", 3]}});
        let (merged, rejections) = merge_validated(&defaults(), &overrides, MINIMUMS);
        assert_eq!(merged["guards"]["paths"], json!([".env"]));
        assert_eq!(rejections[0].path, "guards.paths");
    }

    #[test]
    fn integers_respect_minimum_and_sign() {
        let overrides = json!({"guards": {"diffSize": {"maxLines": 0}}, "limit": -1});
        let (merged, rejections) = merge_validated(&defaults(), &overrides, MINIMUMS);
        assert_eq!(merged["guards"]["diffSize"]["maxLines"], json!(500));
        assert_eq!(merged["limit"], json!(0));
        let paths: Vec<&str> = rejections.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["guards.diffSize.maxLines", "limit"]);
    }

    #[test]
    fn floats_are_rejected_for_integer_fields() {
        let overrides = json!({"limit": 2.5});
        let (merged, _) = merge_validated(&defaults(), &overrides, MINIMUMS);
        assert_eq!(merged["limit"], json!(0));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let overrides = json!({"extra": true, "guards": {"other": {}}});
        let (merged, rejections) = merge_validated(&defaults(), &overrides, MINIMUMS);
        assert_eq!(merged, defaults());
        assert!(rejections.is_empty());
    }

    #[test]
    fn non_object_override_yields_defaults() {
        let (merged, rejections) = merge_validated(&defaults(), &json!([1, 2]), MINIMUMS);
        assert_eq!(merged, defaults());
        assert_eq!(rejections.len(), 1);
    }

    #[test]
    fn object_replaced_by_scalar_keeps_whole_default_subtree() {
        let overrides = json!({"guards": {"diffSize": false}, "name": null});
        let (merged, rejections) = merge_validated(&defaults(), &overrides, MINIMUMS);
        assert_eq!(merged, defaults());
        assert_eq!(rejections.len(), 2);
    }

    #[test]
    fn merged_types_always_match_defaults() {
        let base = defaults();
        let overrides = json!({
            "name": 1,
            "guards": {"diffSize": {"enabled": "yes", "maxLines": 10}, "paths": "x"},
            "limit": 7
        });
        let (merged, _) = merge_validated(&base, &overrides, MINIMUMS);
        assert_same_shape(&base, &merged);
        assert_eq!(merged["guards"]["diffSize"]["maxLines"], json!(10));
        assert_eq!(merged["limit"], json!(7));
    }

    fn assert_same_shape(expected: &Value, actual: &Value) {
        assert_eq!(type_name(expected), type_name(actual));
        if let (Some(a), Some(b)) = (expected.as_object(), actual.as_object()) {
            for (key, value) in a {
                assert_same_shape(value, &b[key]);
            }
        }
    }
}
