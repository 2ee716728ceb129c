//! Tool executor trait

use async_trait::async_trait;

/// Executes tool calls requested by the LLM
///
/// Returns the tool output as a string (usually JSON) on success, or an
/// error message that is passed back to the model as a failed tool result.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool call
    ///
    /// * `tool_use_id` - Provider-assigned identifier for this invocation
    /// * `name` - Name of the tool to execute
    /// * `arguments` - Tool arguments as a JSON value
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String>;
}
