//! Key-level comparison of two flattened configurations.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::info;

use crate::flatten::{flatten, FlatConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct ChangedEntry {
    pub key: String,
    pub old: Value,
    pub new: Value,
}

/// Four disjoint partitions of the union of both key sets, each in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    pub only_a: Vec<(String, Value)>,
    pub only_b: Vec<(String, Value)>,
    pub changed: Vec<ChangedEntry>,
    pub unchanged: Vec<(String, Value)>,
}

impl DiffResult {
    pub fn only_a_count(&self) -> usize {
        self.only_a.len()
    }

    pub fn only_b_count(&self) -> usize {
        self.only_b.len()
    }

    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }

    pub fn unchanged_count(&self) -> usize {
        self.unchanged.len()
    }

    pub fn is_identical(&self) -> bool {
        self.only_a.is_empty() && self.only_b.is_empty() && self.changed.is_empty()
    }
}

/// Exact value equality: `"1"` and `1` differ.
pub fn diff(a: &FlatConfig, b: &FlatConfig) -> DiffResult {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    let mut result = DiffResult::default();

    for key in keys {
        match (a.get(key), b.get(key)) {
            (Some(old), None) => result.only_a.push((key.clone(), old.clone())),
            (None, Some(new)) => result.only_b.push((key.clone(), new.clone())),
            (Some(old), Some(new)) if old != new => result.changed.push(ChangedEntry {
                key: key.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            (Some(same), Some(_)) => result.unchanged.push((key.clone(), same.clone())),
            (None, None) => unreachable!("key comes from one of the two maps"),
        }
    }
    result
}

/// Default vs customer execution configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigComparison {
    /// The customer document carries no data: the account runs on defaults.
    UsingDefaults { defaults: Value },
    Overrides(DiffResult),
}

fn has_data(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Compares the `data` members of two execution-config responses. An empty customer
/// document short-circuits to [`ConfigComparison::UsingDefaults`].
pub fn compare_configs(default_response: &Value, customer_response: &Value) -> ConfigComparison {
    let default_data = match default_response.get("data") {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(data) => data.clone(),
    };
    let customer_data = customer_response.get("data");

    if !has_data(customer_data) {
        info!("Customer config carries no overrides");
        return ConfigComparison::UsingDefaults {
            defaults: default_data,
        };
    }

    let flat_default = flatten(&default_data, "");
    let flat_customer = customer_data
        .map(|data| flatten(data, ""))
        .unwrap_or_default();
    let result = diff(&flat_default, &flat_customer);
    info!(
        changed = result.changed_count(),
        customer_only = result.only_b_count(),
        default_only = result.only_a_count(),
        unchanged = result.unchanged_count(),
        "Compared execution configs"
    );
    ConfigComparison::Overrides(result)
}
