//! Config validation - warns about unknown fields

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Validate JSON config and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return;
    };

    for path in find_unknown_keys(&value, &expected_config_keys(), "") {
        warn!("Unknown config field in {config_name}: {path}");
    }
}

/// Warn about unknown keys in each action record.
pub fn warn_unknown_action_fields(content: &str, config_name: &str) {
    let Ok(Value::Array(records)) = serde_json::from_str::<Value>(content) else {
        return;
    };

    let expected = expected_action_keys();
    for (index, record) in records.iter().enumerate() {
        for path in find_unknown_keys(record, &expected, &format!("[{index}]")) {
            warn!("Unknown action field in {config_name}: {path}");
        }
    }
}

/// Find unknown keys in JSON value compared to expected keys.
/// Returns paths like "connection.unknownField" for unknown fields.
fn find_unknown_keys(value: &Value, expected: &ExpectedKeys, prefix: &str) -> Vec<String> {
    let mut unknowns = Vec::new();

    let Value::Object(obj) = value else {
        return unknowns;
    };

    for (key, child) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if let Some(nested) = expected.nested.get(key.as_str()) {
            unknowns.extend(find_unknown_keys(child, nested, &path));
        } else if !expected.fields.contains(key.as_str()) {
            unknowns.push(path);
        }
    }

    unknowns
}

/// `fields` are leaf fields, `nested` are nested objects with their own expected keys.
struct ExpectedKeys {
    fields: HashSet<&'static str>,
    nested: HashMap<&'static str, ExpectedKeys>,
}

impl ExpectedKeys {
    fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.iter().copied().collect(),
            nested: HashMap::new(),
        }
    }

    fn with_nested(mut self, key: &'static str, nested: ExpectedKeys) -> Self {
        self.nested.insert(key, nested);
        self
    }
}

fn expected_config_keys() -> ExpectedKeys {
    let connection_keys = ExpectedKeys::new(&[
        "host",
        "port",
        "password",
        "connectTimeoutMs",
        "requestTimeoutMs",
        "connectAttempts",
    ]);

    ExpectedKeys::new(&["micInput", "actionsFile"]).with_nested("connection", connection_keys)
}

fn expected_action_keys() -> ExpectedKeys {
    ExpectedKeys::new(&["action", "kind", "command", "source", "filter", "scene"])
}
