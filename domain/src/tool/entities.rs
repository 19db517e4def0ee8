//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Whether `value` is acceptable for this type.
    ///
    /// Integers are accepted where a number is expected, not the reverse.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Schema of a single inspection tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "get_ec2_instances")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Parameter specifications
    pub parameters: Vec<ToolParameter>,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub param_type: ParamType,
    /// Value applied when the model omits the parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Whether the tool declares a parameter called `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
            default: None,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The tool catalog advertised to the model, plus alias mappings.
///
/// Definitions are kept in name order so the schema list sent on every
/// inference request is stable.
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: BTreeMap<String, ToolDefinition>,
    /// Alias → canonical name mapping (e.g. "describe_instances" → "get_ec2_instances")
    aliases: HashMap<String, String>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    /// Register a single alias mapping (builder pattern)
    pub fn register_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    /// Register multiple aliases at once (builder pattern)
    pub fn register_aliases(
        mut self,
        mappings: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        for (alias, canonical) in mappings {
            self.aliases.insert(alias.into(), canonical.into());
        }
        self
    }

    /// Resolve an alias to its canonical name (aliases only, not canonical names)
    pub fn resolve_alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(|s| s.as_str())
    }

    /// Resolve a name: canonical names resolve to themselves, aliases to
    /// their target, anything else to `None`.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.contains_key(name) {
            Some(name)
        } else {
            self.resolve_alias(name)
        }
    }

    /// Get tool definition by canonical name or alias
    pub fn get_resolved(&self, name: &str) -> Option<&ToolDefinition> {
        self.resolve(name).and_then(|canonical| self.tools.get(canonical))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing_tool() -> ToolDefinition {
        ToolDefinition::new("get_rds_instances", "List RDS instances")
            .with_parameter(ToolParameter::new("region", "AWS region to query", false))
    }

    #[test]
    fn param_type_accepts() {
        assert!(ParamType::Integer.accepts(&json!(168)));
        assert!(!ParamType::Integer.accepts(&json!(1.5)));
        assert!(ParamType::Number.accepts(&json!(3)));
        assert!(ParamType::Array.accepts(&json!(["Average"])));
        assert!(!ParamType::String.accepts(&json!(null)));
    }

    #[test]
    fn definition_lookup() {
        let tool = ToolDefinition::new("get_ec2_cpu_utilization", "CPU")
            .with_parameter(ToolParameter::new("instance_id", "Instance", true))
            .with_parameter(
                ToolParameter::new("start_hours_ago", "Hours", false)
                    .with_type(ParamType::Integer)
                    .with_default(168),
            );

        assert!(tool.declares("instance_id"));
        assert!(!tool.declares("region"));
        assert_eq!(tool.required_parameters().count(), 1);
        assert_eq!(
            tool.parameter("start_hours_ago").and_then(|p| p.default.clone()),
            Some(json!(168))
        );
    }

    #[test]
    fn spec_resolves_aliases() {
        let spec = ToolSpec::new()
            .register(listing_tool())
            .register_alias("describe_db_instances", "get_rds_instances");

        assert_eq!(spec.resolve("get_rds_instances"), Some("get_rds_instances"));
        assert_eq!(spec.resolve("describe_db_instances"), Some("get_rds_instances"));
        assert_eq!(spec.resolve("drop_database"), None);
        assert_eq!(
            spec.get_resolved("describe_db_instances").map(|d| d.name.as_str()),
            Some("get_rds_instances")
        );
        assert!(spec.get("describe_db_instances").is_none());
    }

    #[test]
    fn spec_lists_in_name_order() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("get_s3_buckets", ""))
            .register(ToolDefinition::new("get_cost_forecast", ""))
            .register(ToolDefinition::new("get_log_groups", ""));

        let names: Vec<_> = spec.names().collect();
        assert_eq!(names, vec!["get_cost_forecast", "get_log_groups", "get_s3_buckets"]);
        assert_eq!(spec.len(), 3);
    }
}
