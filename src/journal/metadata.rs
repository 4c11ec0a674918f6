use crate::error::MigrateError;
use crate::journal::frontmatter::kind_of;
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema-free frontmatter fields with typed, coercing accessors.
///
/// A key counts as present only when its value is non-null and not blank;
/// accessors return `None` for absent keys and for values that do not coerce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    fields: BTreeMap<String, Value>,
}

impl From<BTreeMap<String, Value>> for Metadata {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !is_blank(v))
    }

    /// The first of `keys`, in order, that is present.
    pub fn first_present(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn int_first(&self, keys: &[&str]) -> Option<i64> {
        self.first_present(keys).and_then(coerce_i64)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(coerce_f64)
    }

    /// A scalar rendered as trimmed text. Lists and mappings are a shape error.
    pub fn text(&self, key: &str) -> Result<Option<String>, MigrateError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        scalar_text(value).map(Some).ok_or_else(|| {
            MigrateError::MetadataShape(format!("`{key}` must be a scalar, found {}", kind_of(value)))
        })
    }

    /// Tags from a native list or a `[a, b]` / `a, b` string.
    pub fn tags(&self, key: &str) -> Result<Vec<String>, MigrateError> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        match value {
            Value::Array(items) => Ok(items
                .iter()
                .filter_map(scalar_text)
                .filter(|t| !t.is_empty())
                .collect()),
            Value::String(raw) => Ok(split_tag_string(raw)),
            Value::Number(_) | Value::Bool(_) => Ok(scalar_text(value).into_iter().collect()),
            other => Err(MigrateError::MetadataShape(format!(
                "`{key}` must be a list or string, found {}",
                kind_of(other)
            ))),
        }
    }
}

fn split_tag_string(raw: &str) -> Vec<String> {
    raw.replace(['[', ']'], "")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        let Value::Object(map) = value else {
            panic!("fixture must be an object");
        };
        Metadata::from(map.into_iter().collect::<BTreeMap<_, _>>())
    }

    const P_KEYS: [&str; 3] = ["p-score", "p_score", "p"];

    #[test]
    fn first_match_wins_in_key_order() {
        let m = meta(json!({"p": 2, "p_score": 5, "p-score": 7}));
        assert_eq!(m.int_first(&P_KEYS), Some(7));

        let m = meta(json!({"p": 2, "p_score": 5}));
        assert_eq!(m.int_first(&P_KEYS), Some(5));
    }

    #[test]
    fn blank_values_fall_through_to_next_key() {
        let m = meta(json!({"p-score": "", "p_score": null, "p": "4"}));
        assert_eq!(m.int_first(&P_KEYS), Some(4));
    }

    #[test]
    fn zero_is_a_real_score() {
        let m = meta(json!({"p-score": 0, "p": 9}));
        assert_eq!(m.int_first(&P_KEYS), Some(0));
    }

    #[test]
    fn uncoercible_score_is_absent() {
        let m = meta(json!({"p-score": "great", "p": 9}));
        assert_eq!(m.int_first(&P_KEYS), None);
    }

    #[test]
    fn floats_and_numeric_strings_truncate() {
        assert_eq!(meta(json!({"p": 6.8})).int_first(&P_KEYS), Some(6));
        assert_eq!(meta(json!({"p": " 8 "})).int_first(&P_KEYS), Some(8));
        assert_eq!(meta(json!({"p": "7.5"})).int_first(&P_KEYS), Some(7));
    }

    #[test]
    fn weight_coerces_numbers_and_strings() {
        assert_eq!(meta(json!({"weight": 71.5})).float("weight"), Some(71.5));
        assert_eq!(meta(json!({"weight": "70"})).float("weight"), Some(70.0));
        assert_eq!(meta(json!({"weight": "heavy"})).float("weight"), None);
        assert_eq!(meta(json!({})).float("weight"), None);
    }

    #[test]
    fn bracketed_tag_string_splits_and_trims() {
        let m = meta(json!({"tags": "[work, health]"}));
        assert_eq!(m.tags("tags").unwrap(), vec!["work", "health"]);
    }

    #[test]
    fn native_tag_list_is_kept_in_order() {
        let m = meta(json!({"tags": ["health", " work ", "", 2024]}));
        assert_eq!(m.tags("tags").unwrap(), vec!["health", "work", "2024"]);
    }

    #[test]
    fn absent_tags_are_empty() {
        assert!(meta(json!({"tags": null})).tags("tags").unwrap().is_empty());
        assert!(meta(json!({})).tags("tags").unwrap().is_empty());
    }

    #[test]
    fn mapping_tags_are_shape_error() {
        let err = meta(json!({"tags": {"a": 1}})).tags("tags").unwrap_err();
        assert!(matches!(err, MigrateError::MetadataShape(_)));
    }

    #[test]
    fn text_rejects_lists() {
        let m = meta(json!({"date": ["2024-03-01"]}));
        assert!(m.text("date").is_err());
        let m = meta(json!({"date": "2024-03-01"}));
        assert_eq!(m.text("date").unwrap().as_deref(), Some("2024-03-01"));
    }
}
