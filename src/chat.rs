//! Conversational offer generation
//!
//! The model asks clarifying questions until it has enough detail, then
//! calls `generate_final_offer`. Sessions live in memory and are dropped once
//! an offer is produced or after an hour without activity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::generator::{inventory_tools, GenerationError, OfferGenerator};
use crate::llm::tools::create_tool_declaration;
use crate::llm::{Agent, AgentOutcome, Message, ToolChoice};
use crate::models::{ChatReply, ChatRequest, CustomerInfo, Material, Offer, OfferStatus, PriceDetail};

pub const FINAL_OFFER_TOOL: &str = "generate_final_offer";

const CHAT_SYSTEM_PROMPT: &str = "You are a professional offer generator assistant for construction and service projects.

Your role is to have a conversation with the user to understand their project requirements before generating an offer.

IMPORTANT GUIDELINES:
1. If the user's initial request is vague or missing important details, ask clarifying questions.
2. Ask about: project scope, area size, preferred materials, quality level, timeline preferences, etc.
3. Keep questions concise and focused. Ask 1-2 questions at a time.
4. When you have enough information to create a comprehensive offer, call the generate_final_offer tool.
5. You can use get_inventory_data to check available materials and pricing.

DO NOT generate an offer until you have sufficient details. It's better to ask questions than to make assumptions.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Session expired or not found. Please start a new conversation with customer info and project start.")]
    SessionNotFound,

    #[error("Error in chat: {0}")]
    Generation(#[from] GenerationError),
}

/// Input of the final offer tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FinalOfferArgs {
    /// Detailed description of the work to be done
    pub task_description: String,
    /// Array of materials needed
    pub bill_of_materials: Vec<Material>,
    /// Estimated completion time
    pub time: String,
    /// Total cost of materials
    pub materials_cost: f64,
    /// Total cost of labor
    pub labor_cost: f64,
    /// Total project cost (materials + labor)
    pub total_cost: f64,
}

#[derive(Debug, Clone)]
struct ChatSession {
    history: Vec<Message>,
    customer: CustomerInfo,
    project_start: NaiveDate,
}

impl ChatSession {
    fn into_offer(self, args: FinalOfferArgs) -> Offer {
        Offer {
            customer_name: self.customer.customer_name,
            phone_number: self.customer.phone_number,
            address: self.customer.address,
            customer_email: self.customer.customer_email.unwrap_or_default(),
            task_description: args.task_description,
            bill_of_materials: args.bill_of_materials,
            time: args.time,
            resource: self.customer.resource.unwrap_or_default(),
            status: OfferStatus::Pending,
            price: PriceDetail {
                materials: args.materials_cost,
                labor: args.labor_cost,
                total: args.total_cost,
            },
            project_start: self.project_start,
            materials_ordered: false,
        }
    }
}

/// Sessions idle this long are dropped
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

struct SessionSlot {
    session: Option<ChatSession>,
    last_used: Instant,
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

/// Chat sessions keyed by client-chosen id
///
/// Turns on one session run one at a time; a second request for the same id
/// waits for the first to finish. Idle sessions are evicted on the next
/// request after `idle_timeout`.
pub struct ChatService {
    generator: OfferGenerator,
    sessions: Mutex<HashMap<String, SharedSlot>>,
    idle_timeout: Duration,
}

impl ChatService {
    pub fn new(generator: OfferGenerator) -> Self {
        Self {
            generator,
            sessions: Mutex::new(HashMap::new()),
            idle_timeout: SESSION_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sessions with an open conversation, including ones mid-turn
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .filter(|slot| slot.try_lock().map_or(true, |s| s.session.is_some()))
            .count()
    }

    async fn slot(&self, session_id: &str) -> SharedSlot {
        let mut sessions = self.sessions.lock().await;

        // Slots in use are never evicted
        let before = sessions.len();
        sessions.retain(|_, slot| match slot.try_lock() {
            Ok(s) => s.last_used.elapsed() < self.idle_timeout,
            Err(_) => true,
        });
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "dropped idle chat sessions");
        }

        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionSlot {
                    session: None,
                    last_used: Instant::now(),
                }))
            })
            .clone()
    }

    /// Run one conversation turn
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let ChatRequest {
            session_id,
            message,
            customer_info,
            project_start,
        } = request;

        let slot = self.slot(&session_id).await;
        let mut slot = slot.lock().await;
        slot.last_used = Instant::now();

        let session = match (slot.session.take(), customer_info, project_start) {
            (Some(session), _, _) => session,
            (None, Some(customer), Some(project_start)) => {
                tracing::info!(%session_id, "starting chat session");
                ChatSession {
                    history: Vec::new(),
                    customer,
                    project_start,
                }
            }
            _ => return Err(ChatError::SessionNotFound),
        };

        let mut registry = inventory_tools(self.generator.inventory());
        registry.declare(create_tool_declaration::<FinalOfferArgs>(
            FINAL_OFFER_TOOL,
            "Generate the final offer when you have gathered enough information from the user. \
             Only call this when you have sufficient details about the project requirements, scope, and preferences.",
        ));
        let declarations = registry.declarations();

        let mut agent = Agent::new(
            self.generator.provider(),
            Arc::new(registry),
            declarations,
            self.generator.config().with_tool_choice(ToolChoice::Auto),
            Some(CHAT_SYSTEM_PROMPT.to_string()),
        )
        .with_history(session.history.clone())
        .with_terminal_tools([FINAL_OFFER_TOOL]);

        let outcome = match agent.complete(message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                slot.session = Some(session);
                return Err(GenerationError::from(e).into());
            }
        };
        slot.last_used = Instant::now();

        match outcome {
            AgentOutcome::Reply(text) => {
                slot.session = Some(ChatSession {
                    history: agent.into_messages(),
                    ..session
                });
                Ok(ChatReply::Message { message: text })
            }
            AgentOutcome::Submitted { input, .. } => {
                let args: FinalOfferArgs = match serde_json::from_value(input) {
                    Ok(args) => args,
                    Err(e) => {
                        slot.session = Some(session);
                        return Err(GenerationError::from(e).into());
                    }
                };
                tracing::info!(%session_id, "chat produced an offer; closing session");
                Ok(ChatReply::Offer {
                    offer: session.into_offer(args),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{text_turn, tool_turn, ScriptedProvider};
    use crate::llm::StreamEvent;
    use crate::store::MemoryStore;

    fn service(turns: Vec<Vec<StreamEvent>>) -> (ChatService, Arc<ScriptedProvider>) {
        let provider = ScriptedProvider::new(turns);
        let generator = OfferGenerator::new(
            provider.clone(),
            Arc::new(MemoryStore::default()),
            1024,
        );
        (ChatService::new(generator), provider)
    }

    fn first_request(message: &str) -> ChatRequest {
        ChatRequest {
            session_id: "s1".to_string(),
            message: message.to_string(),
            customer_info: Some(CustomerInfo {
                customer_name: "Jane Doe".to_string(),
                phone_number: "555-0100".to_string(),
                address: "1 Main St".to_string(),
                customer_email: None,
                resource: Some("Bob".to_string()),
            }),
            project_start: NaiveDate::from_ymd_opt(2025, 4, 1),
        }
    }

    fn follow_up(message: &str) -> ChatRequest {
        ChatRequest {
            session_id: "s1".to_string(),
            message: message.to_string(),
            customer_info: None,
            project_start: None,
        }
    }

    fn final_offer_json() -> String {
        serde_json::json!({
            "task_description": "Paint two bedrooms",
            "bill_of_materials": [],
            "time": "3 days",
            "materials_cost": 150.0,
            "labor_cost": 600.0,
            "total_cost": 750.0
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_unknown_session_without_customer_info() {
        let (chat, _) = service(vec![]);
        let err = chat.handle(follow_up("Hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_question_then_offer() {
        let (chat, provider) = service(vec![
            text_turn("How large are the rooms?"),
            tool_turn("call-1", FINAL_OFFER_TOOL, &final_offer_json()),
        ]);

        let reply = chat.handle(first_request("Paint my bedrooms")).await.unwrap();
        assert_eq!(
            reply,
            ChatReply::Message {
                message: "How large are the rooms?".to_string()
            }
        );
        assert_eq!(chat.session_count().await, 1);

        let reply = chat.handle(follow_up("Two rooms, 12 m2 each")).await.unwrap();
        let ChatReply::Offer { offer } = reply else {
            panic!("expected an offer");
        };
        assert_eq!(offer.customer_name, "Jane Doe");
        assert_eq!(offer.resource, "Bob");
        assert_eq!(offer.customer_email, "");
        assert_eq!(offer.price.total, 750.0);
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.project_start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(chat.session_count().await, 0);

        // Second call carries the whole conversation
        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].config.tool_choice, Some(ToolChoice::Auto));
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_session() {
        let (chat, _) = service(vec![text_turn("What colour?")]);

        chat.handle(first_request("Paint my bedrooms")).await.unwrap();
        // The scripted provider has no more responses
        let err = chat.handle(follow_up("Blue")).await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));
        assert_eq!(chat.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_idle_session_is_evicted() {
        let (chat, _) = service(vec![text_turn("What colour?")]);
        let chat = chat.with_idle_timeout(Duration::ZERO);

        chat.handle(first_request("Paint my bedrooms")).await.unwrap();
        let err = chat.handle(follow_up("Blue")).await.unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound));
        assert_eq!(chat.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_turns_share_session() {
        let (chat, provider) = service(vec![
            text_turn("How large are the rooms?"),
            text_turn("Which colour?"),
        ]);

        let (first, second) = tokio::join!(
            chat.handle(first_request("Paint my bedrooms")),
            chat.handle(follow_up("Two rooms")),
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(chat.session_count().await, 1);
        // The second turn saw the first turn's exchange
        assert_eq!(provider.requests()[1].messages.len(), 3);
    }
}
