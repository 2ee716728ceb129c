//! Mapping between abstraction types and OpenAI Chat Completions types

use std::collections::HashMap;

use crate::llm::core::config::ToolChoice;
use crate::llm::core::error::LlmError;
use crate::llm::core::types::{
    ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
    MessageMetadata, MessageRole, PartialToolUse, StreamEvent, ToolDeclaration, UsageMetadata,
};

use super::types::{
    ChatCompletionChunk, ChatCompletionRequest, NamedFunction, OpenAiFunction, OpenAiFunctionCall,
    OpenAiMessage, OpenAiTool, OpenAiToolCall, OpenAiToolChoice, StreamOptions,
};

/// Convert our abstraction request to a streaming Chat Completions request
pub fn to_openai_request(request: GenerateRequest, model: &str) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system {
        messages.push(OpenAiMessage {
            role: "system".to_string(),
            content: Some(system),
            ..Default::default()
        });
    }
    for message in request.messages {
        messages.extend(to_openai_messages(message));
    }

    let tools: Option<Vec<OpenAiTool>> = request
        .tools
        .filter(|tools| !tools.is_empty())
        .map(|tools| tools.into_iter().map(to_openai_tool).collect());

    let tool_choice = match tools {
        Some(_) => request.config.tool_choice.map(to_openai_tool_choice),
        None => None,
    };

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        tools,
        tool_choice,
        max_tokens: request.config.max_tokens,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        stop: request.config.stop_sequences,
        stream: true,
        stream_options: StreamOptions {
            include_usage: true,
        },
    }
}

/// One abstraction message can expand to several OpenAI messages:
/// every tool result is its own `tool` message.
fn to_openai_messages(message: Message) -> Vec<OpenAiMessage> {
    match message.role {
        MessageRole::User => vec![OpenAiMessage {
            role: "user".to_string(),
            content: Some(message.text()),
            ..Default::default()
        }],
        MessageRole::Assistant => {
            let text = message.text();
            let tool_calls: Vec<OpenAiToolCall> = message
                .content
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => Some(OpenAiToolCall {
                        id,
                        call_type: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name,
                            arguments: input.to_string(),
                        },
                    }),
                    _ => None,
                })
                .collect();

            vec![OpenAiMessage {
                role: "assistant".to_string(),
                content: if text.is_empty() { None } else { Some(text) },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            }]
        }
        MessageRole::Tool => message
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => Some(OpenAiMessage {
                    role: "tool".to_string(),
                    content: Some(if is_error {
                        format!("Error: {}", content)
                    } else {
                        content
                    }),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id),
                }),
                _ => None,
            })
            .collect(),
    }
}

fn to_openai_tool(tool: ToolDeclaration) -> OpenAiTool {
    OpenAiTool {
        tool_type: "function".to_string(),
        function: OpenAiFunction {
            name: tool.name,
            description: tool.description,
            parameters: tool.input_schema,
        },
    }
}

fn to_openai_tool_choice(choice: ToolChoice) -> OpenAiToolChoice {
    match choice {
        ToolChoice::Auto => OpenAiToolChoice::Mode("auto".to_string()),
        ToolChoice::Required => OpenAiToolChoice::Mode("required".to_string()),
        ToolChoice::Tool(name) => OpenAiToolChoice::Named {
            choice_type: "function".to_string(),
            function: NamedFunction { name },
        },
    }
}

fn to_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::EndTurn,
        "length" => FinishReason::MaxTokens,
        "tool_calls" | "function_call" => FinishReason::ToolUse,
        "content_filter" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenBlock {
    Text,
    Tool,
}

/// Turns Chat Completions chunks into block-structured stream events
///
/// OpenAI streams a flat sequence of deltas. This keeps track of which
/// block is open so that text and each tool call get their own
/// `ContentBlockStart`/`ContentBlockEnd` pair, in order.
#[derive(Debug, Default)]
pub struct ChunkMapper {
    started: bool,
    finished: bool,
    next_index: usize,
    open: Option<(usize, OpenBlock)>,
    tool_blocks: HashMap<usize, usize>,
    finish_reason: Option<FinishReason>,
    usage: UsageMetadata,
}

impl ChunkMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one decoded chunk
    pub fn map_chunk(&mut self, chunk: ChatCompletionChunk) -> Result<Vec<StreamEvent>, LlmError> {
        if let Some(error) = chunk.error {
            return Err(LlmError::ProviderError {
                code: error.error_type.unwrap_or_else(|| "error".to_string()),
                message: error.message,
            });
        }

        let mut events = Vec::new();
        self.ensure_started(&chunk.id, &mut events);

        if let Some(usage) = chunk.usage {
            self.usage = UsageMetadata::new(usage.prompt_tokens, usage.completion_tokens);
        }

        // Only the first choice is requested
        for choice in chunk.choices.into_iter().filter(|c| c.index == 0) {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                let index = self.open_text(&mut events);
                events.push(StreamEvent::ContentDelta {
                    index,
                    delta: ContentDelta::TextDelta { text },
                });
            }

            for call in choice.delta.tool_calls.unwrap_or_default() {
                let function = call.function.unwrap_or_default();
                let index = match call.id {
                    Some(id) => self.open_tool(call.index, id, function.name, &mut events),
                    None => match self.tool_blocks.get(&call.index) {
                        Some(index) => *index,
                        None => continue,
                    },
                };

                if let Some(partial_json) = function.arguments.filter(|a| !a.is_empty()) {
                    events.push(StreamEvent::ContentDelta {
                        index,
                        delta: ContentDelta::ToolUseDelta {
                            partial: PartialToolUse {
                                id: None,
                                name: None,
                                partial_json,
                            },
                        },
                    });
                }
            }

            if let Some(reason) = choice.finish_reason {
                self.close_open(&mut events);
                self.finish_reason = Some(to_finish_reason(&reason));
            }
        }

        Ok(events)
    }

    /// Handle the `[DONE]` sentinel
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut events = Vec::new();
        self.ensure_started("", &mut events);
        self.close_open(&mut events);
        events.push(StreamEvent::MessageEnd {
            finish_reason: self.finish_reason.take().unwrap_or(FinishReason::EndTurn),
            usage: self.usage,
        });
        events
    }

    fn ensure_started(&mut self, id: &str, events: &mut Vec<StreamEvent>) {
        if self.started {
            return;
        }
        self.started = true;
        events.push(StreamEvent::MessageStart {
            message: MessageMetadata {
                id: id.to_string(),
                role: MessageRole::Assistant,
                usage: None,
            },
        });
    }

    fn open_text(&mut self, events: &mut Vec<StreamEvent>) -> usize {
        if let Some((index, OpenBlock::Text)) = self.open {
            return index;
        }
        self.close_open(events);

        let index = self.next_index;
        self.next_index += 1;
        self.open = Some((index, OpenBlock::Text));
        events.push(StreamEvent::ContentBlockStart {
            index,
            block: ContentBlockStart::Text {
                text: String::new(),
            },
        });
        index
    }

    fn open_tool(
        &mut self,
        call_index: usize,
        id: String,
        name: Option<String>,
        events: &mut Vec<StreamEvent>,
    ) -> usize {
        self.close_open(events);

        let index = self.next_index;
        self.next_index += 1;
        self.open = Some((index, OpenBlock::Tool));
        self.tool_blocks.insert(call_index, index);
        events.push(StreamEvent::ContentBlockStart {
            index,
            block: ContentBlockStart::ToolUse {
                id,
                name: name.unwrap_or_default(),
            },
        });
        index
    }

    fn close_open(&mut self, events: &mut Vec<StreamEvent>) {
        if let Some((index, _)) = self.open.take() {
            events.push(StreamEvent::ContentBlockEnd { index });
        }
    }
}
