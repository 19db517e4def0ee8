//! Tool domain traits
//!
//! Pure validation of normalized arguments against a definition. The async
//! execution port lives in the application layer.

use super::arguments::Arguments;
use super::catalog::ROLE_ARN_PARAM;
use super::entities::ToolDefinition;

/// Validator for tool arguments
pub trait ToolValidator {
    /// Validate normalized arguments against a definition.
    ///
    /// The error string is returned to the model verbatim.
    fn validate(&self, arguments: &Arguments, definition: &ToolDefinition) -> Result<(), String>;
}

/// Checks required parameters, unknown parameters and JSON types.
///
/// `role_arn` is implicit on every tool and always accepted.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, arguments: &Arguments, definition: &ToolDefinition) -> Result<(), String> {
        for param in definition.required_parameters() {
            if !arguments.contains_key(&param.name) {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, definition.name
                ));
            }
        }

        for (name, value) in arguments {
            if name == ROLE_ARN_PARAM {
                if !value.is_string() {
                    return Err(format!("Parameter '{}' must be a string", ROLE_ARN_PARAM));
                }
                continue;
            }

            let Some(param) = definition.parameter(name) else {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    name, definition.name
                ));
            };

            if !param.param_type.accepts(value) {
                return Err(format!(
                    "Parameter '{}' for tool '{}' must be of type {}",
                    name, definition.name, param.param_type
                ));
            }
        }

        Ok(())
    }
}
