//! Agent loop
//!
//! The agent:
//! - Maintains conversation history
//! - Calls the LLM and streams all responses
//! - Executes tool calls through a `ToolExecutor`
//! - Loops until the model answers in plain text or calls a terminal tool
//!
//! Terminal tools carry structured output. They are declared to the model
//! like any other tool, but when the model calls one the loop stops and the
//! call's input is handed back to the caller.

mod error;

pub use error::AgentError;

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;

use crate::llm::core::{
    config::GenerationConfig,
    provider::LlmProvider,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration,
    },
};
use crate::llm::tools::executor::ToolExecutor;

/// Tool result recorded for a terminal tool call
const TERMINAL_TOOL_ACK: &str = r#"{"status":"accepted"}"#;

/// Events emitted by the agent during execution
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Raw LLM streaming event (text deltas, tool calls, etc.)
    LlmEvent(StreamEvent),

    /// Agent is executing a tool call
    ToolExecutionStarted {
        tool_use_id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed successfully
    ToolExecutionCompleted {
        tool_use_id: String,
        name: String,
        result: String,
    },

    /// Tool execution failed; the error is passed back to the model
    ToolExecutionFailed {
        tool_use_id: String,
        name: String,
        error: String,
    },

    /// Agent is starting a new iteration (calling LLM again after tool execution)
    IterationStarted { iteration: usize },

    /// The model called a terminal tool; the loop ends here
    Submitted {
        tool_use_id: String,
        name: String,
        input: serde_json::Value,
    },

    /// The model answered with text only; the loop ends here
    Completed,
}

/// How a completed agent run ended
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    /// Plain-text answer
    Reply(String),
    /// Structured output delivered through a terminal tool
    Submitted {
        name: String,
        input: serde_json::Value,
    },
}

/// Helper struct for accumulating partial tool use data
struct PartialToolUseAccumulator {
    id: String,
    name: String,
    input: String,
}

/// Agent that manages conversation history and tool execution
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tool_executor: Arc<dyn ToolExecutor>,
    tool_declarations: Vec<ToolDeclaration>,
    terminal_tools: HashSet<String>,
    messages: Vec<Message>,
    config: GenerationConfig,
    system: Option<String>,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent with an empty history
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tool_executor: Arc<dyn ToolExecutor>,
        tool_declarations: Vec<ToolDeclaration>,
        config: GenerationConfig,
        system: Option<String>,
    ) -> Self {
        Self {
            provider,
            tool_executor,
            tool_declarations,
            terminal_tools: HashSet::new(),
            messages: Vec::new(),
            config,
            system,
            max_iterations: 10,
        }
    }

    /// Set the maximum number of LLM calls per run (default: 10)
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Seed the conversation with earlier turns
    pub fn with_history(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Mark tools whose call ends the loop
    pub fn with_terminal_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminal_tools = names.into_iter().map(Into::into).collect();
        self
    }

    /// Process a new user message through the agent loop
    ///
    /// The returned stream emits `IterationStarted` before each LLM call,
    /// the raw `LlmEvent`s, `ToolExecution*` events for executed tools, and
    /// finally either `Submitted` or `Completed`.
    pub async fn run(
        &mut self,
        user_message: impl Into<String>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + '_>>, AgentError>
    {
        self.messages.push(Message::user(user_message));

        let stream = self.create_agent_stream();

        Ok(Box::pin(stream))
    }

    /// Run the loop to completion and report how it ended
    pub async fn complete(
        &mut self,
        user_message: impl Into<String>,
    ) -> Result<AgentOutcome, AgentError> {
        let submitted = {
            let mut stream = self.run(user_message).await?;
            let mut submitted = None;
            while let Some(event) = stream.next().await {
                match event? {
                    AgentEvent::Submitted { name, input, .. } => {
                        submitted = Some(AgentOutcome::Submitted { name, input });
                    }
                    AgentEvent::ToolExecutionFailed { name, error, .. } => {
                        tracing::warn!(tool = %name, %error, "tool call failed");
                    }
                    _ => {}
                }
            }
            submitted
        };

        if let Some(outcome) = submitted {
            return Ok(outcome);
        }

        let reply = self
            .messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(Message::text)
            .unwrap_or_default();
        Ok(AgentOutcome::Reply(reply))
    }

    /// Get the full conversation history
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Take the conversation history, consuming the agent
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    fn create_agent_stream(&mut self) -> impl Stream<Item = Result<AgentEvent, AgentError>> + '_ {
        stream! {
            let mut iteration = 0;

            loop {
                iteration += 1;

                if iteration > self.max_iterations {
                    yield Err(AgentError::MaxIterationsReached(iteration - 1));
                    return;
                }

                yield Ok(AgentEvent::IterationStarted { iteration });

                let request = GenerateRequest {
                    messages: self.messages.clone(),
                    tools: Some(self.tool_declarations.clone()),
                    config: self.config.clone(),
                    system: self.system.clone(),
                };

                let llm_stream = match self.provider.stream_generate(request).await {
                    Ok(s) => s,
                    Err(e) => {
                        yield Err(AgentError::Llm(e));
                        return;
                    }
                };

                let mut text_content = String::new();
                let mut tool_uses = Vec::new();
                let mut current_tool_use: Option<PartialToolUseAccumulator> = None;
                let mut ended = false;

                pin_mut!(llm_stream);

                while let Some(event_result) = llm_stream.next().await {
                    let event = match event_result {
                        Ok(e) => e,
                        Err(e) => {
                            yield Err(AgentError::Llm(e));
                            return;
                        }
                    };

                    yield Ok(AgentEvent::LlmEvent(event.clone()));

                    match &event {
                        StreamEvent::ContentBlockStart { block, .. } => match block {
                            ContentBlockStart::Text { text } => {
                                text_content.push_str(text);
                            }
                            ContentBlockStart::ToolUse { id, name } => {
                                current_tool_use = Some(PartialToolUseAccumulator {
                                    id: id.clone(),
                                    name: name.clone(),
                                    input: String::new(),
                                });
                            }
                        },
                        StreamEvent::ContentDelta { delta, .. } => match delta {
                            ContentDelta::TextDelta { text } => {
                                text_content.push_str(text);
                            }
                            ContentDelta::ToolUseDelta { partial } => {
                                if let Some(tool_use) = &mut current_tool_use {
                                    tool_use.input.push_str(&partial.partial_json);
                                }
                            }
                        },
                        StreamEvent::ContentBlockEnd { .. } => {
                            if let Some(tool_use) = current_tool_use.take() {
                                // A call without arguments streams no JSON at all
                                let raw = if tool_use.input.trim().is_empty() {
                                    "{}"
                                } else {
                                    tool_use.input.as_str()
                                };
                                match serde_json::from_str(raw) {
                                    Ok(input) => {
                                        tool_uses.push(ContentBlock::ToolUse {
                                            id: tool_use.id,
                                            name: tool_use.name,
                                            input,
                                        });
                                    }
                                    Err(e) => {
                                        yield Err(AgentError::ToolInputParse(e));
                                        return;
                                    }
                                }
                            }
                        }
                        StreamEvent::Error { error } => {
                            yield Err(AgentError::Provider(error.clone()));
                            return;
                        }
                        StreamEvent::MessageEnd { .. } => {
                            ended = true;
                            break;
                        }
                        _ => {}
                    }
                }

                if !ended {
                    yield Err(AgentError::UnexpectedStreamEnd);
                    return;
                }

                let mut assistant_content = Vec::new();
                if !text_content.is_empty() {
                    assistant_content.push(ContentBlock::Text { text: text_content });
                }

                if tool_uses.is_empty() {
                    self.messages.push(Message {
                        role: MessageRole::Assistant,
                        content: assistant_content,
                    });

                    yield Ok(AgentEvent::Completed);
                    return;
                }

                assistant_content.extend(tool_uses.clone());
                self.messages.push(Message {
                    role: MessageRole::Assistant,
                    content: assistant_content,
                });

                let mut submitted = None;

                for block in tool_uses {
                    let ContentBlock::ToolUse { id, name, input } = block else {
                        continue;
                    };

                    if self.terminal_tools.contains(&name) {
                        self.messages.push(Message::tool_result(id.clone(), TERMINAL_TOOL_ACK));
                        if submitted.is_none() {
                            submitted = Some(AgentEvent::Submitted {
                                tool_use_id: id,
                                name,
                                input,
                            });
                        }
                        continue;
                    }

                    yield Ok(AgentEvent::ToolExecutionStarted {
                        tool_use_id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    });

                    match self.tool_executor.execute(id.clone(), name.clone(), input).await {
                        Ok(result) => {
                            self.messages.push(Message::tool_result(id.clone(), result.clone()));
                            yield Ok(AgentEvent::ToolExecutionCompleted {
                                tool_use_id: id,
                                name,
                                result,
                            });
                        }
                        Err(error) => {
                            self.messages.push(Message::tool_error(id.clone(), error.clone()));
                            yield Ok(AgentEvent::ToolExecutionFailed {
                                tool_use_id: id,
                                name,
                                error,
                            });
                        }
                    }
                }

                if let Some(event) = submitted {
                    yield Ok(event);
                    return;
                }
            }
        }
    }
}
