//! Tool System
//!
//! Extensible tool framework for agent capabilities. Tools are registered
//! at runtime and invoked by the run loop when a remote run demands
//! outputs. Dispatch never fails the run: every failure mode is converted
//! into a structured error payload the model can read and react to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::Result;

/// Pseudo-tool name some models hallucinate when batching calls
const PARALLEL_PSEUDO_TOOL: &str = "multi_tool_use.parallel";

/// Corrective instruction sent back when the pseudo-tool shows up
pub const PARALLEL_TOOL_REMEDIATION: &str = "Please ignore any 'multi_tool_use.parallel' \
     functions. They are not real. Simply send the functions in an array. Please try again.";

/// Payload returned when a tool name has no registry entry
pub const FUNCTION_NOT_FOUND: &str = "Function not found.";

/// Tool definition schema (for remote function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// JSON Schema for the arguments object
    pub parameters: Value,
}

impl ToolSchema {
    /// Wrap the schema in the `{"type":"function",...}` envelope the
    /// assistants wire format expects in assistant-creation payloads
    pub fn to_wire(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }

    /// Schema for a tool that takes no arguments
    pub fn no_args(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }
}

/// Tool trait - implement to add new capabilities
///
/// The returned string is handed verbatim to the remote run as the tool
/// output, so tools format their own success and no-data messages.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for remote function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the parsed arguments object
    async fn execute(&self, arguments: &Value) -> Result<String>;
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name, Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool schemas
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Wire-format function definitions for assistant creation
    pub fn wire_schemas(&self) -> Vec<Value> {
        self.tools.values().map(|t| t.schema().to_wire()).collect()
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve and invoke one required call, always producing an output
    ///
    /// Unknown names, malformed arguments, and tool failures all come back
    /// as `{"status":"error","msg":...}` payloads rather than errors, so a
    /// single bad call never aborts the surrounding run.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> String {
        if name.contains(PARALLEL_PSEUDO_TOOL) {
            info!("received '{PARALLEL_PSEUDO_TOOL}' hallucination, sending error to assistant");
            return error_payload(PARALLEL_TOOL_REMEDIATION);
        }

        let Some(tool) = self.get(name) else {
            error!(tool = name, "function not found in registry");
            return error_payload(FUNCTION_NOT_FOUND);
        };

        let parsed: Value = match serde_json::from_str(arguments) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = name, error = %e, "malformed tool arguments");
                return error_payload(&format!("Invalid arguments: {e}"));
            }
        };

        match tool.execute(&parsed).await {
            Ok(output) => {
                info!(tool = name, "function successful");
                output
            }
            Err(e) => {
                error!(tool = name, error = %e, "function failed");
                error_payload(&e.to_string())
            }
        }
    }
}

/// Structured error payload fed back to the model as a tool output
fn error_payload(msg: &str) -> String {
    json!({"status": "error", "msg": msg}).to_string()
}
