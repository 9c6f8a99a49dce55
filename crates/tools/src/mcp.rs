//! Tool interface and schemas
//!
//! Arguments are validated against the declared schema before a tool body
//! runs, so an invalid call never mutates local state; the remote caller
//! receives the validation error instead.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default timeout for tool execution (seconds)
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Tool execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool '{tool}' timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        ToolError::InvalidParams(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ToolError::NotFound(message.into())
    }

    pub fn timeout(tool: impl Into<String>, seconds: u64) -> Self {
        ToolError::Timeout {
            tool: tool.into(),
            seconds,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        ToolError::Execution(message.into())
    }
}

/// Result of a tool call, returned to the remote agent as text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Declared schema for one tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// JSON-object input schema with a builder surface
#[derive(Debug, Clone, Serialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: &'static str,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object",
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Validate an argument object against this schema.
    pub fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let object = input
            .as_object()
            .ok_or_else(|| ToolError::invalid_params("arguments must be a JSON object"))?;

        for name in &self.required {
            if !object.contains_key(name) {
                return Err(ToolError::invalid_params(format!(
                    "missing required argument: {}",
                    name
                )));
            }
        }

        for (name, value) in object {
            let Some(property) = self.properties.get(name) else {
                continue;
            };
            property.validate(name, value)?;
        }

        Ok(())
    }
}

/// Schema for a single property
#[derive(Debug, Clone, Serialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: &'static str,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

impl PropertySchema {
    fn new(property_type: &'static str, description: impl Into<String>) -> Self {
        Self {
            property_type,
            description: description.into(),
            enum_values: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new("string", description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new("integer", description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new("boolean", description)
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn validate(&self, name: &str, value: &Value) -> Result<(), ToolError> {
        match self.property_type {
            "string" => {
                let s = value.as_str().ok_or_else(|| {
                    ToolError::invalid_params(format!("{} must be a string", name))
                })?;
                if let Some(allowed) = &self.enum_values {
                    if !allowed.iter().any(|a| a == s) {
                        return Err(ToolError::invalid_params(format!(
                            "{} must be one of [{}], got '{}'",
                            name,
                            allowed.join(", "),
                            s
                        )));
                    }
                }
            }
            "integer" => {
                let n = value.as_i64().ok_or_else(|| {
                    ToolError::invalid_params(format!("{} must be an integer", name))
                })?;
                if let Some(min) = self.minimum {
                    if n < min {
                        return Err(ToolError::invalid_params(format!(
                            "{} must be at least {}, got {}",
                            name, min, n
                        )));
                    }
                }
                if let Some(max) = self.maximum {
                    if n > max {
                        return Err(ToolError::invalid_params(format!(
                            "{} must be at most {}, got {}",
                            name, max, n
                        )));
                    }
                }
            }
            "boolean" => {
                if !value.is_boolean() {
                    return Err(ToolError::invalid_params(format!(
                        "{} must be a boolean",
                        name
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    /// Schema-boundary validation, run before `execute`.
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        self.schema().input_schema.validate(input)
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Per-tool execution timeout
    fn timeout_secs(&self) -> u64 {
        DEFAULT_TOOL_TIMEOUT_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rating_schema() -> InputSchema {
        InputSchema::object().property(
            "rating",
            PropertySchema::integer("1 to 3").with_range(1, 3),
            true,
        )
    }

    #[test]
    fn test_required_argument_enforced() {
        let err = rating_schema().validate(&json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
    }

    #[test]
    fn test_integer_range() {
        assert!(rating_schema().validate(&json!({"rating": 2})).is_ok());
        assert!(rating_schema().validate(&json!({"rating": 0})).is_err());
        assert!(rating_schema().validate(&json!({"rating": 4})).is_err());
    }

    #[test]
    fn test_non_integer_rejected() {
        assert!(rating_schema().validate(&json!({"rating": 2.5})).is_err());
        assert!(rating_schema().validate(&json!({"rating": "2"})).is_err());
    }

    #[test]
    fn test_enum_membership() {
        let schema = InputSchema::object().property(
            "region",
            PropertySchema::string("where").with_enum(&["norwich", "yarmouth", "all"]),
            true,
        );
        assert!(schema.validate(&json!({"region": "all"})).is_ok());
        assert!(schema.validate(&json!({"region": "london"})).is_err());
    }

    #[test]
    fn test_unknown_arguments_pass_through() {
        // The remote side may send extras; they are ignored, not fatal
        let schema = InputSchema::object();
        assert!(schema.validate(&json!({"surprise": true})).is_ok());
    }
}
