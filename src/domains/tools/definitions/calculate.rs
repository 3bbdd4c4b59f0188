//! Calculate tool definition.
//!
//! A tool that performs basic arithmetic on two numbers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domains::tools::{
    Arguments, CallContext, ParamSpec, ParameterSchema, RegistryError, StagingRegistry, Tool,
    ToolError, ToolOutput,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the calculate tool.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculateParams {
    /// One of add, subtract, multiply, divide.
    pub operation: String,

    /// First operand.
    pub x: f64,

    /// Second operand.
    pub y: f64,
}

/// Supported arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    fn apply(self, x: f64, y: f64) -> Result<f64, CalculateError> {
        match self {
            Self::Add => Ok(x + y),
            Self::Subtract => Ok(x - y),
            Self::Multiply => Ok(x * y),
            Self::Divide if y == 0.0 => Err(CalculateError::DivideByZero),
            Self::Divide => Ok(x / y),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CalculateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CalculateError::UnsupportedOperation(s.to_string()))
    }
}

/// Business errors of the calculate tool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculateError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("cannot divide by zero")]
    DivideByZero,

    #[error("result of {0} is not a finite number")]
    NonFinite(Operation),
}

// ============================================================================
// Output Structure (JSON format for AI agents)
// ============================================================================

/// Result of a calculation.
#[derive(Debug, Serialize, JsonSchema)]
struct CalculationResult {
    /// Operation that was applied
    operation: String,
    /// First operand
    x: f64,
    /// Second operand
    y: f64,
    /// Computed value
    result: f64,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Calculate tool - basic arithmetic.
pub struct CalculateTool;

impl CalculateTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "calculate";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Perform basic arithmetic operations";

    /// Build an instance for registration.
    pub fn create() -> Arc<dyn Tool> {
        Arc::new(Self)
    }

    /// Compute `x <operation> y`.
    pub fn calculate(params: &CalculateParams) -> Result<f64, CalculateError> {
        let operation: Operation = params.operation.parse()?;
        let value = operation.apply(params.x, params.y)?;
        if !value.is_finite() {
            return Err(CalculateError::NonFinite(operation));
        }
        Ok(value)
    }
}

/// Registrar for the calculate tool.
pub fn register(staging: &StagingRegistry) -> Result<(), RegistryError> {
    staging.register_factory(CalculateTool::NAME, CalculateTool::create)
}

#[async_trait::async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .with(
                ParamSpec::one_of("operation", Operation::ALL.map(Operation::as_str))
                    .required()
                    .describe("The operation to perform (add, subtract, multiply, divide)"),
            )
            .with(ParamSpec::number("x").required().describe("First number"))
            .with(ParamSpec::number("y").required().describe("Second number"))
    }

    fn output_schema(&self) -> Option<Arc<JsonObject>> {
        Some(Arc::new(schema_for_type::<CalculationResult>()))
    }

    #[instrument(skip_all)]
    async fn execute(&self, context: &CallContext, arguments: &Arguments) -> ToolOutput {
        if context.is_cancelled() {
            return ToolError::Cancelled(Self::NAME.to_string()).into();
        }

        // Parse again even though dispatch validated: direct callers skip that step
        let params: CalculateParams =
            match serde_json::from_value(serde_json::Value::Object(arguments.clone())) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Invalid calculate parameters: {}", e);
                    return ToolOutput::failure(format!("invalid parameters: {}", e));
                }
            };

        info!(
            "Calculate tool called: {} {} {}",
            params.x, params.operation, params.y
        );

        let value = match Self::calculate(&params) {
            Ok(v) => v,
            Err(e) => {
                warn!("Calculation failed: {}", e);
                return ToolOutput::failure(e.to_string());
            }
        };

        let result = CalculationResult {
            operation: params.operation,
            x: params.x,
            y: params.y,
            result: value,
        };

        match serde_json::to_value(&result) {
            Ok(structured) => ToolOutput::structured(format!("{:.2}", value), structured),
            Err(_) => ToolOutput::success(format!("{:.2}", value)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(arguments: serde_json::Value) -> ToolOutput {
        let arguments = arguments.as_object().cloned().unwrap_or_default();
        CalculateTool.execute(&CallContext::new(), &arguments).await
    }

    #[tokio::test]
    async fn test_add() {
        let output = run(json!({ "operation": "add", "x": 2, "y": 3 })).await;
        assert!(output.is_success());
        assert_eq!(output.text(), "5.00");
    }

    #[tokio::test]
    async fn test_each_operation() {
        let cases = [
            ("subtract", 7.5, 2.0, "5.50"),
            ("multiply", 4.0, 2.5, "10.00"),
            ("divide", 1.0, 3.0, "0.33"),
        ];
        for (operation, x, y, expected) in cases {
            let output = run(json!({ "operation": operation, "x": x, "y": y })).await;
            assert_eq!(output.text(), expected, "operation {operation}");
        }
    }

    #[tokio::test]
    async fn test_divide_by_zero() {
        let output = run(json!({ "operation": "divide", "x": 1, "y": 0 })).await;
        assert!(output.is_failure());
        assert!(output.text().contains("divide by zero"));
    }

    #[tokio::test]
    async fn test_unsupported_operation() {
        let output = run(json!({ "operation": "modulo", "x": 1, "y": 1 })).await;
        assert!(output.is_failure());
        assert!(output.text().contains("modulo"));
    }

    #[tokio::test]
    async fn test_invalid_parameter_type() {
        let output = run(json!({ "operation": "add", "x": "two", "y": 3 })).await;
        assert!(output.is_failure());
        assert!(output.text().starts_with("invalid parameters"));
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let context = CallContext::new();
        context.cancellation().cancel();

        let arguments = json!({ "operation": "add", "x": 1, "y": 1 })
            .as_object()
            .cloned()
            .unwrap();
        let output = CalculateTool.execute(&context, &arguments).await;
        assert!(output.is_failure());
        assert!(output.text().contains("cancelled"));
    }

    #[test]
    fn test_overflow_is_rejected() {
        let params = CalculateParams {
            operation: "multiply".to_string(),
            x: f64::MAX,
            y: 2.0,
        };
        assert_eq!(
            CalculateTool::calculate(&params),
            Err(CalculateError::NonFinite(Operation::Multiply))
        );
    }

    #[tokio::test]
    async fn test_structured_content_in_result() {
        let output = run(json!({ "operation": "multiply", "x": 3, "y": 4 })).await;
        let structured = output.structured_content().expect("structured content");
        assert_eq!(structured["operation"], "multiply");
        assert_eq!(structured["result"], 12.0);
    }

    #[test]
    fn test_schema_declares_required_parameters() {
        let schema = CalculateTool.schema();
        let names: Vec<_> = schema.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["operation", "x", "y"]);
        assert!(schema.params().iter().all(|p| p.required));
    }

    #[test]
    fn test_to_tool() {
        let tool = CalculateTool.to_tool();
        assert_eq!(tool.name, "calculate");
        assert_eq!(
            tool.input_schema["properties"]["operation"]["enum"],
            json!(["add", "subtract", "multiply", "divide"])
        );
        assert!(tool.output_schema.is_some());
    }

    #[test]
    fn test_register() {
        let staging = StagingRegistry::new();
        register(&staging).unwrap();
        assert!(staging.contains(CalculateTool::NAME));
        assert!(register(&staging).is_err());
    }
}
