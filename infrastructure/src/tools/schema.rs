//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] that produces provider-neutral
//! JSON Schema for the inference service's tool-use API.

use costpilot_application::ToolSchemaPort;
use costpilot_domain::{ParamType, ToolDefinition, ToolParameter};
use serde_json::{Map, Value, json};

/// Converts catalog definitions to `{name, description, input_schema}`.
///
/// Declared defaults are advertised so the model knows what an omitted
/// argument means. `role_arn` is never advertised; the registry fills it in.
pub struct JsonSchemaToolConverter;

impl JsonSchemaToolConverter {
    fn property(param: &ToolParameter) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(param.param_type.as_str()));
        prop.insert("description".to_string(), json!(param.description));

        if param.param_type == ParamType::Array {
            // Arrays of strings when the default says so, otherwise of objects.
            let item_type = match param.default.as_ref().and_then(|d| d.get(0)) {
                Some(Value::String(_)) => "string",
                _ => "object",
            };
            prop.insert("items".to_string(), json!({"type": item_type}));
        }
        if let Some(default) = &param.default {
            prop.insert("default".to_string(), default.clone());
        }
        Value::Object(prop)
    }
}

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            properties.insert(param.name.clone(), Self::property(param));
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costpilot_domain::InspectionTool;

    #[test]
    fn test_metric_statistics_schema() {
        let schema = JsonSchemaToolConverter
            .tool_to_schema(&InspectionTool::MetricStatistics.definition());

        assert_eq!(schema["name"], "get_metric_statistics");
        assert_eq!(schema["input_schema"]["type"], "object");

        let props = &schema["input_schema"]["properties"];
        assert_eq!(props["namespace"]["type"], "string");
        assert_eq!(props["period"]["type"], "integer");
        assert_eq!(props["period"]["default"], 3600);
        assert_eq!(props["dimensions"]["items"]["type"], "object");
        assert_eq!(props["statistics"]["items"]["type"], "string");
        assert!(props.get("role_arn").is_none());

        let required: Vec<&str> = schema["input_schema"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["namespace", "metric_name", "dimensions"]);
    }

    #[test]
    fn test_parameterless_tool_schema() {
        let schema =
            JsonSchemaToolConverter.tool_to_schema(&InspectionTool::S3Buckets.definition());
        assert_eq!(schema["name"], "get_s3_buckets");
        assert!(schema["input_schema"]["properties"].as_object().unwrap().is_empty());
        assert!(schema["input_schema"]["required"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_all_tools_schema_covers_catalog() {
        let tools = JsonSchemaToolConverter.all_tools_schema(&InspectionTool::spec());
        assert_eq!(tools.len(), InspectionTool::ALL.len());

        // Canonical names only, in name order
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(!names.contains(&"describe_instances"));
    }
}
