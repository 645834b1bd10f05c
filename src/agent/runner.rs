//! Course agent with tool calling loop.

use super::events::{collect_text, TurnEvent};
use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::error::{LaereError, Result, TurnError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use std::time::Duration;
use tracing::{debug, info};

/// Default wall-clock limit for one turn.
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;

/// Fallback system prompt when no configured prompt is supplied.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a course architect with access to content discovery tools.

Discover sources for the requested topic, pull concrete material from the best ones, and then write a complete course as a single JSON object.

Guidelines:
- Use 'discover_sources' first for the course topic
- Use 'analyze_tech_stack' to pick a category and difficulty
- Use 'generate_search_queries' and rerun discovery when results are thin
- Use 'fetch_repository_file' to read files from discovered repositories
- Use 'tracked_sources' before answering and list those sources in source_from

When you have gathered enough material, respond with only the course JSON."#;

/// Agent that drives one model conversation per course request.
pub struct CourseAgent {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    tools: ToolContext,
    max_iterations: usize,
    turn_timeout: Duration,
    system_prompt: String,
}

impl CourseAgent {
    /// Agent over a tool context, using the given chat model.
    pub fn new(tools: ToolContext, model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            tools,
            max_iterations: 15,
            turn_timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Replace the OpenAI client, for explicit credentials.
    pub fn with_client(
        mut self,
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
    ) -> Self {
        self.client = client;
        self
    }

    /// Replace the built-in system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Cap the number of model round-trips in one turn.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Set the wall-clock limit for one turn.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Run one turn against a fresh session.
    ///
    /// Each call builds its own message history; nothing carries over between
    /// turns. When the deadline fires the in-flight session is dropped at its
    /// await point, which cancels any round still talking to the API.
    pub async fn run_turn(&self, prompt: &str) -> Result<TurnOutcome> {
        match tokio::time::timeout(self.turn_timeout, self.drive_session(prompt)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TurnError::Timeout {
                limit_secs: self.turn_timeout.as_secs(),
            }
            .into()),
        }
    }

    async fn drive_session(&self, prompt: &str) -> Result<TurnOutcome> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| LaereError::Agent(e.to_string()))?
                .into(),
        ];

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| LaereError::Agent(e.to_string()))?
                .into(),
        );

        let mut iterations = 0;
        let mut events: Vec<TurnEvent> = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(LaereError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(tool_definitions())
                .build()
                .map_err(|e| LaereError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| TurnError::Upstream {
                    detail: e.to_string(),
                })?;

            let choice = response.choices.first().ok_or_else(|| TurnError::Upstream {
                detail: "Response contained no choices".to_string(),
            })?;

            let content = choice.message.content.clone();
            let tool_calls = choice.message.tool_calls.clone().unwrap_or_default();

            if tool_calls.is_empty() {
                // Final round: whatever text it carries joins the fold
                if let Some(text) = content.filter(|t| !t.is_empty()) {
                    events.push(TurnEvent::Text { content: text });
                }
                return outcome_from_events(events, iterations);
            }

            // Text arriving alongside tool calls is part of the answer too
            match &content {
                Some(text) if !text.is_empty() => events.push(TurnEvent::Text {
                    content: text.clone(),
                }),
                _ => events.push(TurnEvent::Thought),
            }

            let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
            assistant.tool_calls(tool_calls.clone());
            if let Some(text) = content.filter(|t| !t.is_empty()) {
                assistant.content(text);
            }
            messages.push(
                assistant
                    .build()
                    .map_err(|e| LaereError::Agent(e.to_string()))?
                    .into(),
            );

            for tool_call in &tool_calls {
                events.push(TurnEvent::ToolInvocation {
                    name: tool_call.function.name.clone(),
                    arguments: tool_call.function.arguments.clone(),
                });

                let output = self.execute_tool_call(tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(output.clone())
                    .build()
                    .map_err(|e| LaereError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                events.push(TurnEvent::ToolResult {
                    name: tool_call.function.name.clone(),
                    output,
                });
            }
        }
    }

    /// Execute a single tool call, folding failures into the result string.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> String {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Tool call: {}({})", name, arguments);

        match parse_tool_call(name, arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        }
    }
}

/// Fold a finished turn's events into an outcome.
fn outcome_from_events(events: Vec<TurnEvent>, iterations: usize) -> Result<TurnOutcome> {
    let text = collect_text(&events);
    if text.trim().is_empty() {
        return Err(TurnError::EmptyResponse.into());
    }

    Ok(TurnOutcome {
        text,
        events,
        iterations,
    })
}

/// Outcome of one completed turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Concatenated assistant text, in arrival order.
    pub text: String,
    /// Everything observed during the turn.
    pub events: Vec<TurnEvent>,
    /// Number of model calls used.
    pub iterations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_requires_text() {
        let events = vec![
            TurnEvent::Thought,
            TurnEvent::ToolInvocation {
                name: "discover_sources".to_string(),
                arguments: r#"{"topic": "rust"}"#.to_string(),
            },
            TurnEvent::ToolResult {
                name: "discover_sources".to_string(),
                output: "Found 2 sources".to_string(),
            },
        ];

        let result = outcome_from_events(events, 3);
        assert!(matches!(
            result,
            Err(LaereError::Turn(TurnError::EmptyResponse))
        ));
    }

    #[test]
    fn test_outcome_folds_text_in_order() {
        let events = vec![
            TurnEvent::Text {
                content: "{\"title\":".to_string(),
            },
            TurnEvent::Thought,
            TurnEvent::Text {
                content: " \"Rust\"}".to_string(),
            },
        ];

        let outcome = outcome_from_events(events, 2).unwrap();
        assert_eq!(outcome.text, "{\"title\": \"Rust\"}");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.events.len(), 3);
    }

    #[test]
    fn test_whitespace_only_text_is_empty() {
        let events = vec![TurnEvent::Text {
            content: "  \n\t".to_string(),
        }];

        let result = outcome_from_events(events, 1);
        assert!(matches!(
            result,
            Err(LaereError::Turn(TurnError::EmptyResponse))
        ));
    }
}
