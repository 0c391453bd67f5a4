//! Heuristic extraction of application identifiers from pipeline YAML.
//!
//! Not schema-driven: any `<appid-like key>: <token>` in the document counts, plus the
//! values of appID-like keys in a top-level `tags` mapping.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value as YamlValue;
use tracing::debug;

const APP_ID_KEYS: [&str; 5] = [
    "appid",
    "app_id",
    "appId",
    "application_id",
    "applicationId",
];

const TAG_KEY_MARKERS: [&str; 2] = ["appid", "app_id"];

static APP_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    APP_ID_KEYS
        .iter()
        .map(|key| {
            Regex::new(&format!(
                r#"(?i){}:\s*["']?([^"'\s]+)["']?"#,
                regex::escape(key)
            ))
            .expect("appID pattern is a valid regex")
        })
        .collect()
});

pub fn extract(text: &str) -> BTreeSet<String> {
    let mut app_ids = BTreeSet::new();

    let parsed = match serde_yaml::from_str::<YamlValue>(text) {
        Ok(doc) => Some(doc),
        Err(e) => {
            debug!(error = %e, "Pipeline YAML did not parse, scanning raw text");
            None
        }
    };

    let canonical = parsed
        .as_ref()
        .filter(|doc| is_truthy(doc))
        .and_then(|doc| serde_yaml::to_string(doc).ok());
    scan(canonical.as_deref().unwrap_or(text), &mut app_ids);

    if let Some(tags) = parsed
        .as_ref()
        .and_then(|doc| doc.get("tags"))
        .and_then(YamlValue::as_mapping)
    {
        for (key, value) in tags {
            let key = scalar_text(key).to_lowercase();
            if TAG_KEY_MARKERS.iter().any(|marker| key.contains(marker)) {
                app_ids.insert(scalar_text(value));
            }
        }
    }

    app_ids
}

fn scan(text: &str, app_ids: &mut BTreeSet<String>) {
    for pattern in APP_ID_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            if let Some(token) = captures.get(1) {
                app_ids.insert(token.as_str().to_string());
            }
        }
    }
}

fn is_truthy(doc: &YamlValue) -> bool {
    match doc {
        YamlValue::Null => false,
        YamlValue::Bool(b) => *b,
        YamlValue::String(s) => !s.is_empty(),
        YamlValue::Sequence(items) => !items.is_empty(),
        YamlValue::Mapping(map) => !map.is_empty(),
        YamlValue::Number(_) | YamlValue::Tagged(_) => true,
    }
}

fn scalar_text(value: &YamlValue) -> String {
    match value {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
