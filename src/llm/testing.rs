//! Scripted provider and stream builders shared by unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{
        ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, MessageMetadata,
        MessageRole, PartialToolUse, StreamEvent, UsageMetadata,
    },
};

/// Provider that replays one scripted event list per call
pub(crate) struct ScriptedProvider {
    responses: Vec<Vec<StreamEvent>>,
    pub(crate) requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(responses: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Copy of every request received so far
    pub(crate) fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        match self.responses.get(index) {
            Some(events) => Ok(Box::pin(futures::stream::iter(
                events.clone().into_iter().map(Ok),
            ))),
            None => Err(LlmError::StreamError("No more responses".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn start() -> StreamEvent {
    StreamEvent::MessageStart {
        message: MessageMetadata {
            id: "msg".to_string(),
            role: MessageRole::Assistant,
            usage: None,
        },
    }
}

fn end(reason: FinishReason) -> StreamEvent {
    StreamEvent::MessageEnd {
        finish_reason: reason,
        usage: UsageMetadata::default(),
    }
}

pub(crate) fn text_turn(text: &str) -> Vec<StreamEvent> {
    vec![
        start(),
        StreamEvent::ContentBlockStart {
            index: 0,
            block: ContentBlockStart::Text {
                text: String::new(),
            },
        },
        StreamEvent::ContentDelta {
            index: 0,
            delta: ContentDelta::TextDelta {
                text: text.to_string(),
            },
        },
        StreamEvent::ContentBlockEnd { index: 0 },
        end(FinishReason::EndTurn),
    ]
}

pub(crate) fn tool_turn(id: &str, name: &str, json: &str) -> Vec<StreamEvent> {
    vec![
        start(),
        StreamEvent::ContentBlockStart {
            index: 0,
            block: ContentBlockStart::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
            },
        },
        StreamEvent::ContentDelta {
            index: 0,
            delta: ContentDelta::ToolUseDelta {
                partial: PartialToolUse {
                    id: None,
                    name: None,
                    partial_json: json.to_string(),
                },
            },
        },
        StreamEvent::ContentBlockEnd { index: 0 },
        end(FinishReason::ToolUse),
    ]
}
