//! Feature map validation and row assembly
//!
//! Requests carry features by name; the transform chain only understands
//! positions. Everything is validated here before any numeric work runs.

use crate::errors::{FwiError, Result};
use serde_json::Value;

/// Meteorological fields exchanged between client and server, in model order
pub const FEATURE_NAMES: [&str; 12] = [
    "day",
    "month",
    "year",
    "Temperature",
    "RH",
    "Ws",
    "Rain",
    "FFMC",
    "DMC",
    "DC",
    "ISI",
    "BUI",
];

/// Named input values for one prediction
pub type FeatureMap = serde_json::Map<String, Value>;

/// Read a single feature value as `f64`.
///
/// Numbers and numeric strings are accepted. `null` becomes NaN and is
/// left for the imputer.
pub fn coerce_value(name: &str, value: &Value) -> Result<f64> {
    let invalid = || FwiError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Number(number) => number.as_f64().ok_or_else(invalid),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|parsed| parsed.is_finite())
            .ok_or_else(invalid),
        Value::Null => Ok(f64::NAN),
        _ => Err(invalid()),
    }
}

/// Build the single input row in `feature_names` order.
///
/// Every name is checked for presence and coercibility; keys not listed in
/// `feature_names` are ignored.
pub fn assemble_row(feature_names: &[String], features: &FeatureMap) -> Result<Vec<f64>> {
    feature_names
        .iter()
        .map(|name| {
            let value = features
                .get(name)
                .ok_or_else(|| FwiError::MissingFeature(name.clone()))?;
            coerce_value(name, value)
        })
        .collect()
}

/// Owned copy of [`FEATURE_NAMES`]
pub fn default_feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn map(value: Value) -> FeatureMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn assembles_in_declared_order() {
        let features = map(json!({"b": 2, "a": 1.5, "c": "3"}));
        let row = assemble_row(&names(&["c", "a", "b"]), &features).unwrap();
        assert_eq!(row, vec![3.0, 1.5, 2.0]);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let features = map(json!({"a": 1, "latitude": "36.7", "longitude": "x"}));
        let row = assemble_row(&names(&["a"]), &features).unwrap();
        assert_eq!(row, vec![1.0]);
    }

    #[test]
    fn reports_first_missing_feature() {
        let features = map(json!({"a": 1}));
        match assemble_row(&names(&["a", "b", "c"]), &features) {
            Err(FwiError::MissingFeature(name)) => assert_eq!(name, "b"),
            other => panic!("expected missing feature, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_values() {
        for bad in [json!("hot"), json!(""), json!(true), json!([1]), json!({"v": 1}), json!("inf")] {
            let features = map(json!({ "a": bad.clone() }));
            match assemble_row(&names(&["a"]), &features) {
                Err(FwiError::InvalidValue { name, .. }) => assert_eq!(name, "a"),
                other => panic!("expected invalid value for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn null_becomes_missing_value() {
        let value = coerce_value("Rain", &Value::Null).unwrap();
        assert!(value.is_nan());
    }

    #[test]
    fn numeric_strings_are_trimmed() {
        assert_eq!(coerce_value("RH", &json!(" 40.5 ")).unwrap(), 40.5);
    }

    #[test]
    fn feature_names_match_contract() {
        let owned = default_feature_names();
        assert_eq!(owned.len(), 12);
        assert_eq!(owned.first().map(String::as_str), Some("day"));
        assert_eq!(owned.last().map(String::as_str), Some("BUI"));
    }
}
