//! Argument normalization and cache keys
//!
//! Arguments arrive from the model as a loose JSON object. Before validation
//! and execution they are normalized against the tool definition:
//!
//! 1. `null` values are dropped (treated as omitted)
//! 2. declared defaults fill omitted parameters
//! 3. `region` is defaulted to the profile region when declared and omitted or empty
//! 4. `role_arn` is always set to the profile's identity
//!
//! The normalized map is what the [`CacheKey`] is computed from, so two calls
//! differing only in key order or in spelling out a default share a key.

use super::catalog::{REGION_PARAM, ROLE_ARN_PARAM};
use super::entities::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Arguments = Map<String, Value>;

/// Normalize raw model arguments for `definition`.
pub fn normalize(
    definition: &ToolDefinition,
    raw: &Arguments,
    identity_ref: &str,
    default_region: &str,
) -> Arguments {
    let mut args: Arguments = raw
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for param in &definition.parameters {
        if let Some(default) = &param.default {
            args.entry(param.name.clone()).or_insert_with(|| default.clone());
        }
    }

    if definition.declares(REGION_PARAM) {
        let missing = args
            .get(REGION_PARAM)
            .and_then(Value::as_str)
            .is_none_or(|r| r.trim().is_empty());
        if missing {
            args.insert(REGION_PARAM.to_string(), Value::from(default_region));
        }
    }

    args.insert(ROLE_ARN_PARAM.to_string(), Value::from(identity_ref));

    args
}

/// Serialize `value` with object keys sorted at every depth.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Identity of a tool call for caching: canonical name plus canonical
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(canonical_tool: &str, arguments: &Arguments) -> Self {
        let args = canonical_json(&Value::Object(arguments.clone()));
        Self(format!("{}:{}", canonical_tool, args))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
