//! The tool contract.
//!
//! A tool is a named, self-describing unit of behavior. Each implementation
//! lives in its own file under `definitions/` and implements [`Tool`]; the
//! dispatch layer only ever sees `Arc<dyn Tool>`.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ToolError;
use super::schema::ParameterSchema;

/// Argument bundle of a call: parameter name to JSON value.
pub type Arguments = serde_json::Map<String, Value>;

/// Per-call context handed to [`Tool::execute`].
///
/// Carries the caller's cancellation signal and an optional deadline. The
/// dispatch layer never enforces either; tools observe them cooperatively.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context driven by the given cancellation token.
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            deadline: None,
        }
    }

    /// Attach a deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the token fired or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Outcome of a tool call.
///
/// Failures are ordinary values: a business error, a schema violation and
/// an unknown tool name all end up as [`ToolOutput::Failure`].
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// The call succeeded. `text` is the human-readable payload;
    /// `structured` optionally carries the same result as JSON.
    Success {
        text: String,
        structured: Option<Value>,
    },

    /// The call failed with a human-readable message.
    Failure { message: String },
}

impl ToolOutput {
    /// Create a text-only success.
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success {
            text: text.into(),
            structured: None,
        }
    }

    /// Create a success carrying both a text summary and structured content.
    pub fn structured(text: impl Into<String>, structured: Value) -> Self {
        Self::Success {
            text: text.into(),
            structured: Some(structured),
        }
    }

    /// Create a failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The text payload of a success, or the message of a failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { text, .. } => text,
            Self::Failure { message } => message,
        }
    }

    pub fn structured_content(&self) -> Option<&Value> {
        match self {
            Self::Success { structured, .. } => structured.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    /// Convert into the MCP wire representation.
    pub fn into_call_result(self) -> CallToolResult {
        match self {
            Self::Success { text, structured } => CallToolResult {
                content: vec![Content::text(text)],
                structured_content: structured,
                is_error: Some(false),
                meta: None,
            },
            Self::Failure { message } => CallToolResult::error(vec![Content::text(message)]),
        }
    }
}

impl From<ToolError> for ToolOutput {
    fn from(err: ToolError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Contract every tool implementation satisfies.
///
/// `execute` must not panic: every failure path returns
/// [`ToolOutput::Failure`]. The dispatch layer validates arguments against
/// [`Tool::schema`] first, but implementations should still parse their
/// arguments defensively since other callers may skip that step.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique, stable, non-empty name.
    fn name(&self) -> &str;

    /// Description shown to clients.
    fn description(&self) -> &str;

    /// Parameters this tool accepts.
    fn schema(&self) -> ParameterSchema;

    /// JSON Schema of the structured payload, if the tool produces one.
    fn output_schema(&self) -> Option<Arc<JsonObject>> {
        None
    }

    /// Run the tool.
    async fn execute(&self, context: &CallContext, arguments: &Arguments) -> ToolOutput;

    /// Create a Tool model for this tool (metadata advertised over MCP).
    fn to_tool(&self) -> McpTool {
        McpTool {
            name: self.name().to_string().into(),
            description: Some(self.description().to_string().into()),
            input_schema: Arc::new(self.schema().to_json_schema()),
            annotations: None,
            output_schema: self.output_schema(),
            icons: None,
            meta: None,
            title: None,
        }
    }
}
