//! Declarative parameter schemas.
//!
//! Every tool describes the arguments it accepts with a [`ParameterSchema`].
//! The schema serves two purposes:
//!
//! - the dispatch layer validates an argument bundle against it before the
//!   tool runs (required fields, basic types, enum membership);
//! - it is rendered to a JSON Schema object and advertised to clients as the
//!   tool's `inputSchema`.

use rmcp::model::JsonObject;
use serde_json::{Value, json};

use super::ToolError;
use super::tool::Arguments;

/// Semantic type of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    /// A string restricted to a fixed set of values.
    Enum(Vec<String>),
    Array,
    Object,
}

impl ParamKind {
    /// JSON Schema `type` keyword for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String | Self::Enum(_) => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Declaration of one accepted parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: Option<String>,
}

impl ParamSpec {
    /// Create an optional parameter of the given kind.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    /// A string parameter limited to `values`.
    pub fn one_of<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, ParamKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a human-readable description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check a present value against this declaration.
    fn check(&self, value: &Value) -> Result<(), ToolError> {
        if !self.kind.accepts(value) {
            return Err(ToolError::invalid_argument(&self.name, self.kind.json_type()));
        }

        if let ParamKind::Enum(allowed) = &self.kind {
            // accepts() already guaranteed a string
            let value = value.as_str().unwrap_or_default();
            if !allowed.iter().any(|a| a == value) {
                return Err(ToolError::unsupported_value(&self.name, value, allowed));
            }
        }

        Ok(())
    }

    fn to_json_schema(&self) -> Value {
        let mut property = json!({ "type": self.kind.json_type() });
        if let Some(description) = &self.description {
            property["description"] = json!(description);
        }
        if let ParamKind::Enum(allowed) = &self.kind {
            property["enum"] = json!(allowed);
        }
        property
    }
}

/// The full set of parameters a tool accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    params: Vec<ParamSpec>,
}

impl ParameterSchema {
    /// Create an empty schema (a tool taking no arguments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter declaration.
    pub fn with(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Declared parameters, in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validate an argument bundle.
    ///
    /// Parameters are checked in declaration order and the first problem is
    /// reported. A JSON `null` counts as absent. Arguments that the schema
    /// does not declare are ignored.
    pub fn validate(&self, arguments: &Arguments) -> Result<(), ToolError> {
        for param in &self.params {
            match arguments.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(ToolError::missing_argument(&param.name));
                    }
                }
                Some(value) => param.check(value)?,
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object suitable for an MCP `inputSchema`.
    pub fn to_json_schema(&self) -> JsonObject {
        let properties: serde_json::Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema
    }
}
