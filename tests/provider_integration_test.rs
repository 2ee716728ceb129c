//! Integration tests against live LLM providers
//!
//! These make real API calls. To run them:
//! 1. Copy `.env.example` to `.env` and fill in `OPENAI_API_KEY` and/or `GCP_PROJECT_ID`
//! 2. For Claude, ensure you have valid credentials (`gcloud auth application-default login`)
//! 3. Run: `cargo test --test provider_integration_test -- --ignored`

use std::env;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::StreamExt;
use offerforge::generator::OfferGenerator;
use offerforge::llm::{
    core::types::ContentBlockStart, create_provider, ClaudeModel, ContentDelta, FinishReason,
    GenerateRequest, GenerationConfig, LlmProvider, LlmSettings, Message, StreamEvent,
    ToolDeclaration,
};
use offerforge::models::{NewInventoryItem, OfferRequest};
use offerforge::store::{InventoryRepository, MemoryStore};

async fn claude_provider() -> Arc<dyn LlmProvider> {
    dotenvy::dotenv().ok();

    let project_id = env::var("GCP_PROJECT_ID").expect("GCP_PROJECT_ID required in .env");
    let location = env::var("GCP_LOCATION").unwrap_or_else(|_| "us-central1".to_string());

    create_provider(&LlmSettings::Claude {
        project_id,
        location,
        model: ClaudeModel::Haiku45,
    })
    .await
    .expect("Failed to create Claude provider")
}

async fn openai_provider() -> Arc<dyn LlmProvider> {
    dotenvy::dotenv().ok();

    let api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY required in .env");
    let base_url =
        env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    create_provider(&LlmSettings::OpenAi {
        api_key,
        base_url,
        model,
    })
    .await
    .expect("Failed to create OpenAI provider")
}

fn inventory_tool() -> ToolDeclaration {
    ToolDeclaration {
        name: "get_inventory_data".to_string(),
        description: "Search the company inventory for materials and prices".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Material name or category, e.g. paint"
                }
            },
            "required": ["query"]
        }),
    }
}

async fn collect_text(provider: &dyn LlmProvider, request: GenerateRequest) -> String {
    let mut stream = provider
        .stream_generate(request)
        .await
        .expect("Failed to start stream");

    let mut text = String::new();
    while let Some(event) = stream.next().await {
        if let StreamEvent::ContentDelta {
            delta: ContentDelta::TextDelta { text: t },
            ..
        } = event.expect("Stream error")
        {
            text.push_str(&t);
        }
    }
    text
}

async fn collect_tool_call(
    provider: &dyn LlmProvider,
    request: GenerateRequest,
) -> (Option<String>, String, Option<FinishReason>) {
    let mut stream = provider
        .stream_generate(request)
        .await
        .expect("Failed to start stream");

    let mut tool_name = None;
    let mut tool_input_json = String::new();
    let mut finish_reason = None;

    while let Some(event) = stream.next().await {
        match event.expect("Stream error") {
            StreamEvent::ContentBlockStart {
                block: ContentBlockStart::ToolUse { name, .. },
                ..
            } => tool_name = Some(name),
            StreamEvent::ContentDelta {
                delta: ContentDelta::ToolUseDelta { partial },
                ..
            } => tool_input_json.push_str(&partial.partial_json),
            StreamEvent::MessageEnd {
                finish_reason: reason,
                ..
            } => finish_reason = Some(reason),
            _ => {}
        }
    }

    (tool_name, tool_input_json, finish_reason)
}

fn arithmetic_request() -> GenerateRequest {
    GenerateRequest {
        messages: vec![Message::user("What is 2+2? Answer with just the number.")],
        tools: None,
        config: GenerationConfig::new(100),
        system: None,
    }
}

fn inventory_request() -> GenerateRequest {
    GenerateRequest {
        messages: vec![Message::user(
            "Look up the price of wall paint in our inventory.",
        )],
        tools: Some(vec![inventory_tool()]),
        config: GenerationConfig::new(500),
        system: None,
    }
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_claude_simple_generation() {
    let provider = claude_provider().await;
    let text = collect_text(&*provider, arithmetic_request()).await;

    println!("Response: {}", text);
    assert!(text.contains('4'));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_claude_tool_call() {
    let provider = claude_provider().await;
    let (name, json, finish) = collect_tool_call(&*provider, inventory_request()).await;

    println!("Tool input: {}", json);
    assert_eq!(name.as_deref(), Some("get_inventory_data"));
    assert_eq!(finish, Some(FinishReason::ToolUse));

    let parsed: serde_json::Value =
        serde_json::from_str(&json).expect("Tool input should be valid JSON");
    assert!(parsed.get("query").is_some());
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_openai_simple_generation() {
    let provider = openai_provider().await;
    let text = collect_text(&*provider, arithmetic_request()).await;

    println!("Response: {}", text);
    assert!(text.contains('4'));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_openai_tool_call() {
    let provider = openai_provider().await;
    let (name, json, finish) = collect_tool_call(&*provider, inventory_request()).await;

    println!("Tool input: {}", json);
    assert_eq!(name.as_deref(), Some("get_inventory_data"));
    assert_eq!(finish, Some(FinishReason::ToolUse));
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_openai_generates_offer_from_inventory() {
    let provider = openai_provider().await;

    let inventory = Arc::new(MemoryStore::default());
    inventory
        .create(&NewInventoryItem {
            name: "Wall paint".to_string(),
            category: "Paint".to_string(),
            description: Some("White matte, 10 l bucket".to_string()),
            brand: None,
            default_price: 450.0,
            active: true,
        })
        .await
        .unwrap();

    let generator = OfferGenerator::new(provider, inventory, 4096);
    let request = OfferRequest {
        customer_name: "Jane Doe".to_string(),
        phone_number: "555-0100".to_string(),
        address: "1 Main St".to_string(),
        customer_email: None,
        resource: None,
        project_start: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        select_task: "Painting".to_string(),
        explanation: "Paint a 20 m2 living room white, two coats".to_string(),
        user_id: "u1".to_string(),
    };

    let offer = generator
        .generate_offer(&request)
        .await
        .expect("Failed to generate offer");

    println!("Offer: {:#?}", offer);
    assert_eq!(offer.customer_name, "Jane Doe");
    assert!(!offer.bill_of_materials.is_empty());
    assert!(offer.price.total > 0.0);
}
