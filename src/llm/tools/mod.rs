//! Tool execution framework
//!
//! The `ToolExecutor` trait is what the agent loop calls; `FunctionRegistry`
//! is the standard implementation, mapping tool names to typed async
//! closures and keeping their declarations alongside.

pub mod declaration;
pub mod executor;
pub mod registry;

pub use declaration::create_tool_declaration;
pub use executor::ToolExecutor;
pub use registry::FunctionRegistry;
