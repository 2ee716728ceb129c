//! AI offer generation
//!
//! The model sees only the project (task, explanation, start date, current
//! offer content). Customer personal data never leaves the service; it is
//! merged into the generated content locally.
//!
//! Structured output is a forced call to a terminal tool whose input schema
//! is the expected content type. The agent loop hands that input back
//! without executing anything.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::tools::create_tool_declaration;
use crate::llm::{
    Agent, AgentError, AgentOutcome, FunctionRegistry, GenerationConfig, LlmProvider, ToolChoice,
    ToolDeclaration,
};
use crate::models::{
    bill_of_materials_string, GeneratedOfferContent, InventoryItem, Offer, OfferRequest,
    OfferStatus,
};
use crate::store::InventoryRepository;

pub const INVENTORY_TOOL: &str = "get_inventory_data";
pub const SUBMIT_OFFER_TOOL: &str = "submit_offer";

/// Inventory search results handed to the model
const INVENTORY_RESULT_LIMIT: i64 = 50;

const OFFER_SYSTEM_PROMPT: &str = "You are a professional offer generator assistant.
Generate detailed construction/service offers based on project requirements.

Your offer MUST include ALL of these fields:
- task_description: Detailed description of the work to be done
- bill_of_materials: Array of materials needed (each with category, material, price, description, unit, quantity)
- time: Estimated completion time
- status: Default to \"Pending\"
- price: Object with Materials (float), Labor (float), and Total (float)
- project_start: Use the exact project start date provided
- materials_ordered: Default to false

Use get_inventory_data to look up current materials and prices before pricing the offer.
Provide a comprehensive bill of materials, accurate time estimates, and realistic pricing.
Deliver the finished offer by calling submit_offer.";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("LLM interaction failed: {0}")]
    Agent(#[from] AgentError),

    #[error("Model answered without calling {0}")]
    NoSubmission(String),

    #[error("Model output did not match the expected format: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

/// Arguments of the inventory lookup tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InventoryQuery {
    /// The search query to find relevant information on the database.
    pub query: String,
}

#[derive(Debug, Serialize)]
struct InventoryHit {
    id: Uuid,
    name: String,
    category: String,
    description: String,
    brand: String,
    default_price: f64,
    active: bool,
}

impl From<InventoryItem> for InventoryHit {
    fn from(item: InventoryItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            category: item.category,
            description: item.description.unwrap_or_default(),
            brand: item.brand.unwrap_or_default(),
            default_price: item.default_price,
            active: item.active,
        }
    }
}

/// Search active inventory for the model
///
/// Store failures are reported inside the result so the conversation can go on.
pub async fn inventory_lookup(inventory: &dyn InventoryRepository, query: &str) -> serde_json::Value {
    match inventory
        .search(query, None, true, INVENTORY_RESULT_LIMIT)
        .await
    {
        Ok(items) if items.is_empty() => serde_json::json!({
            "message": format!("No inventory items found for query: {}", query),
            "items": [],
        }),
        Ok(items) => {
            let hits: Vec<InventoryHit> = items.into_iter().map(InventoryHit::from).collect();
            serde_json::json!({
                "query": query,
                "items_found": hits.len(),
                "items": hits,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, query, "inventory lookup failed");
            serde_json::json!({
                "error": format!("Error fetching inventory data: {}", e),
                "items": [],
            })
        }
    }
}

/// Registry holding the inventory lookup tool
pub fn inventory_tools(inventory: Arc<dyn InventoryRepository>) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register_async(
        INVENTORY_TOOL,
        "Search the database for current information on inventory, pricing, and availability of materials and services.",
        move |args: InventoryQuery| {
            let inventory = inventory.clone();
            async move { Ok::<_, String>(inventory_lookup(&*inventory, &args.query).await) }
        },
    );
    registry
}

/// Run one prompt until the model calls `terminal`, and decode its input
pub(crate) async fn submit_structured<T: DeserializeOwned>(
    provider: Arc<dyn LlmProvider>,
    mut registry: FunctionRegistry,
    terminal: ToolDeclaration,
    tool_choice: ToolChoice,
    config: GenerationConfig,
    system: &str,
    prompt: String,
) -> Result<T, GenerationError> {
    let terminal_name = terminal.name.clone();
    registry.declare(terminal);
    let declarations = registry.declarations();

    let mut agent = Agent::new(
        provider,
        Arc::new(registry),
        declarations,
        config.with_tool_choice(tool_choice),
        Some(system.to_string()),
    )
    .with_terminal_tools([terminal_name.clone()]);

    match agent.complete(prompt).await? {
        AgentOutcome::Submitted { input, .. } => Ok(serde_json::from_value(input)?),
        AgentOutcome::Reply(text) => {
            tracing::warn!(tool = %terminal_name, reply = %text, "model replied instead of submitting");
            Err(GenerationError::NoSubmission(terminal_name))
        }
    }
}

/// Generates and revises offers with an LLM
#[derive(Clone)]
pub struct OfferGenerator {
    provider: Arc<dyn LlmProvider>,
    inventory: Arc<dyn InventoryRepository>,
    max_tokens: u32,
}

impl OfferGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        inventory: Arc<dyn InventoryRepository>,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            inventory,
            max_tokens,
        }
    }

    pub fn provider(&self) -> Arc<dyn LlmProvider> {
        self.provider.clone()
    }

    pub fn inventory(&self) -> Arc<dyn InventoryRepository> {
        self.inventory.clone()
    }

    pub fn config(&self) -> GenerationConfig {
        GenerationConfig::new(self.max_tokens)
    }

    fn submit_declaration() -> ToolDeclaration {
        create_tool_declaration::<GeneratedOfferContent>(
            SUBMIT_OFFER_TOOL,
            "Submit the complete offer once every field is decided.",
        )
    }

    /// Generate a new offer for a customer request
    pub async fn generate_offer(&self, request: &OfferRequest) -> Result<Offer, GenerationError> {
        tracing::info!(
            provider = self.provider.name(),
            task = %request.select_task,
            "generating offer"
        );

        let content: GeneratedOfferContent = submit_structured(
            self.provider.clone(),
            inventory_tools(self.inventory.clone()),
            Self::submit_declaration(),
            ToolChoice::Required,
            self.config(),
            OFFER_SYSTEM_PROMPT,
            generation_prompt(request),
        )
        .await?;

        Ok(Offer {
            customer_name: request.customer_name.clone(),
            phone_number: request.phone_number.clone(),
            address: request.address.clone(),
            customer_email: request.customer_email.clone().unwrap_or_default(),
            task_description: content.task_description,
            bill_of_materials: content.bill_of_materials,
            time: content.time,
            resource: request.resource.clone().unwrap_or_default(),
            status: OfferStatus::Pending,
            price: content.price,
            project_start: request.project_start,
            materials_ordered: false,
        })
    }

    /// Revise an existing offer following the user's instructions
    pub async fn update_offer(
        &self,
        user_message: &str,
        existing: &Offer,
    ) -> Result<Offer, GenerationError> {
        tracing::info!(provider = self.provider.name(), "updating offer");

        let content: GeneratedOfferContent = submit_structured(
            self.provider.clone(),
            FunctionRegistry::new(),
            Self::submit_declaration(),
            ToolChoice::Tool(SUBMIT_OFFER_TOOL.to_string()),
            self.config(),
            OFFER_SYSTEM_PROMPT,
            update_prompt(user_message, existing),
        )
        .await?;

        Ok(Offer {
            customer_name: existing.customer_name.clone(),
            phone_number: existing.phone_number.clone(),
            address: existing.address.clone(),
            customer_email: existing.customer_email.clone(),
            task_description: content.task_description,
            bill_of_materials: content.bill_of_materials,
            time: content.time,
            resource: existing.resource.clone(),
            status: content.status.unwrap_or(existing.status),
            price: content.price,
            project_start: content.project_start.unwrap_or(existing.project_start),
            materials_ordered: content
                .materials_ordered
                .unwrap_or(existing.materials_ordered),
        })
    }
}

fn generation_prompt(request: &OfferRequest) -> String {
    format!(
        "Generate a professional offer for the following project:

Project Start Date: {start} (MUST use this exact date)
Task Selected: {task}
Additional Details: {details}
Status: \"Pending\"
Materials_ordered: false

Please provide:
1. Detailed task_description based on the task selected and explanation
2. Complete bill_of_materials with category, material name, price, description, unit, and quantity
3. Time estimate for completion
4. Total price breakdown with Materials, Labor, and Total in the 'price' field",
        start = request.project_start,
        task = request.select_task,
        details = request.explanation,
    )
}

fn update_prompt(user_message: &str, offer: &Offer) -> String {
    format!(
        "Update the following professional offer based on the user's request:

Current Offer Details:
- Task Description: {task}
- Bill of Materials:
{materials}
- Time: {time}
- Status: {status}
- Project Start Date: {start}
- Price: Materials {materials_cost:.2}, Labor {labor:.2}, Total {total:.2}
- Materials Ordered: {ordered}

User's Update Request:
{user_message}

IMPORTANT:
- Keep all fields that are not mentioned in the update request unchanged
- Maintain the exact project_start date unless explicitly asked to change it
- Ensure all required fields are present in the updated offer
- Submit the complete offer with all fields",
        task = offer.task_description,
        materials = bill_of_materials_string(&offer.bill_of_materials),
        time = offer.time,
        status = offer.status,
        start = offer.project_start,
        materials_cost = offer.price.materials,
        labor = offer.price.labor,
        total = offer.price.total,
        ordered = offer.materials_ordered,
        user_message = user_message,
    )
}
