//! Flattening of nested JSON into single-level `path -> scalar` maps.
//!
//! Mapping members extend the path with `.key`, sequence elements with `[index]`.
//! Empty mappings and sequences produce no keys, so the transformation is one-way.

use std::collections::BTreeMap;

use serde_json::Value;

/// Structural path to scalar value, in sorted key order.
pub type FlatConfig = BTreeMap<String, Value>;

pub fn flatten(value: &Value, prefix: &str) -> FlatConfig {
    let mut out = FlatConfig::new();
    flatten_into(value, prefix, &mut out);
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut FlatConfig) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, &path, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &format!("{prefix}[{index}]"), out);
            }
        }
        scalar => {
            out.insert(prefix.to_string(), scalar.clone());
        }
    }
}
