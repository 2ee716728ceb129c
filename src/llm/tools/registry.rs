//! Function registry for tool execution

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::declaration::create_tool_declaration;
use super::executor::ToolExecutor;
use crate::llm::core::types::ToolDeclaration;

/// Type alias for boxed async functions
type AsyncToolFn =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, String>> + Send + Sync>;

/// Registry of callable tools
///
/// Arguments are deserialized from the model's JSON into the closure's
/// argument type, and results are serialized back to a JSON string. The
/// JSON Schema declared to the model is derived from the same argument type,
/// so the two cannot drift apart.
///
/// Closures usually capture shared state (a repository handle):
///
/// ```ignore
/// let inventory = store.inventory.clone();
/// let mut registry = FunctionRegistry::new();
/// registry.register_async(
///     "get_inventory_data",
///     "Search the company inventory",
///     move |args: InventoryQuery| {
///         let inventory = inventory.clone();
///         async move { Ok(lookup(&*inventory, &args.query).await) }
///     },
/// );
/// ```
pub struct FunctionRegistry {
    functions: HashMap<String, AsyncToolFn>,
    declarations: Vec<ToolDeclaration>,
}

impl FunctionRegistry {
    /// Create a new empty function registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            declarations: Vec::new(),
        }
    }

    /// Register an async function and declare it to the model
    ///
    /// Registering the same name twice replaces the earlier function and
    /// declaration.
    pub fn register_async<F, Args, R, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        func: F,
    ) where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + JsonSchema + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        let name = name.into();

        let wrapper = move |args_json: serde_json::Value| {
            let args = match serde_json::from_value::<Args>(args_json) {
                Ok(args) => args,
                Err(e) => {
                    let err_msg = format!("Failed to deserialize arguments: {}", e);
                    return Box::pin(async move { Err(err_msg) })
                        as BoxFuture<'static, Result<String, String>>;
                }
            };

            let future = func(args);

            Box::pin(async move {
                match future.await {
                    Ok(result) => serde_json::to_string(&result)
                        .map_err(|e| format!("Failed to serialize result: {}", e)),
                    Err(e) => Err(e),
                }
            }) as BoxFuture<'static, Result<String, String>>
        };

        self.declare(create_tool_declaration::<Args>(name.clone(), description));
        self.functions.insert(name, Box::new(wrapper));
    }

    /// Declare a tool to the model without an executable body
    ///
    /// Used for terminal tools whose call ends the agent loop; the agent
    /// hands their input back to the caller instead of executing them.
    pub fn declare(&mut self, declaration: ToolDeclaration) {
        self.declarations.retain(|d| d.name != declaration.name);
        self.declarations.push(declaration);
    }

    /// Declarations of every registered and declared tool
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.declarations.clone()
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get the number of executable functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry has no executable functions
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    async fn execute_function(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        match self.functions.get(name) {
            Some(func) => func(arguments).await,
            None => Err(format!("Unknown tool: {}", name)),
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for FunctionRegistry {
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        tracing::debug!(tool = %name, %tool_use_id, "executing tool");
        self.execute_function(&name, arguments).await
    }
}
