//! Tool declaration helpers using JSON Schema generation

use schemars::{gen::SchemaSettings, JsonSchema};

use crate::llm::core::types::ToolDeclaration;

/// Create a tool declaration from a type that implements JsonSchema
///
/// Nested types are inlined rather than emitted under `definitions`, since
/// not every provider resolves `$ref`. Doc comments on fields become
/// property descriptions the model can read.
///
/// # Example
///
/// ```ignore
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct InventoryQuery {
///     /// Free-text search over item names and descriptions
///     query: String,
/// }
///
/// let decl = create_tool_declaration::<InventoryQuery>(
///     "get_inventory_data",
///     "Search the company inventory",
/// );
/// ```
pub fn create_tool_declaration<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDeclaration {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();

    ToolDeclaration {
        name: name.into(),
        description: description.into(),
        input_schema: serde_json::to_value(&schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
    }
}
