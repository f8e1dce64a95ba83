//! Core types for LLM interactions

use serde::{Deserialize, Serialize};

/// Model definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier (e.g., "claude-sonnet-4-20250514")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Base URL for API calls
    pub base_url: String,
    /// Maximum output tokens
    pub max_tokens: u32,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input: u32,
    pub output: u32,
}

impl Usage {
    /// Input plus output tokens
    pub fn total(&self) -> u64 {
        self.input as u64 + self.output as u64
    }
}

/// Reason why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    Stop,
    /// Maximum tokens reached
    Length,
    /// Tool use requested
    ToolUse,
}

/// Content types in messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Text content
    Text { text: String },
    /// Structured tool invocation
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
}

impl Content {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool call
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self::ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Get text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A message in the outbound conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// User message
    User { content: Vec<Content> },
    /// Assistant message
    Assistant { content: Vec<Content> },
}

impl Message {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: vec![Content::text(text)],
        }
    }

    /// Create an assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: vec![Content::text(text)],
        }
    }

    /// Get the role as a string
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
        }
    }

    /// Get the content blocks
    pub fn content(&self) -> &[Content] {
        match self {
            Self::User { content } => content,
            Self::Assistant { content } => content,
        }
    }

    /// Get combined text content
    pub fn text(&self) -> String {
        self.content()
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Tool definition for structured output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (used in API calls)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for the tool input
    pub parameters: serde_json::Value,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Tool choice strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides whether to call a tool
    Auto,
    /// The model must call some tool
    Any,
    /// The model must not call a tool
    None,
    /// The model must call the named tool
    Tool { name: String },
}

impl ToolChoice {
    /// Force a specific tool
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }

    /// Check if this choice forces a tool invocation
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::Any | Self::Tool { .. })
    }
}

/// A single request to the LLM boundary
#[derive(Debug, Clone)]
pub struct Request {
    /// Model to use
    pub model: Model,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Available tools
    pub tools: Vec<Tool>,
    /// Tool choice (provider default when None)
    pub tool_choice: Option<ToolChoice>,
}

impl Request {
    /// Create a request for a model with no messages yet
    pub fn new(model: Model, max_tokens: u32) -> Self {
        Self {
            model,
            max_tokens,
            messages: vec![],
            tools: vec![],
            tool_choice: None,
        }
    }

    /// Add a message to the request
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Add a tool to the request
    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }
}

/// A complete response from the LLM boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Ordered content blocks
    pub content: Vec<Content>,
    /// Token usage for the call
    pub usage: Usage,
    /// Why generation stopped
    pub stop_reason: Option<StopReason>,
    /// Model that produced the response
    pub model: Option<String>,
}

impl Completion {
    /// Get combined text content
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Whether generation hit the output token cap
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == Some(StopReason::Length)
    }

    /// Arguments of the first invocation of the named tool
    pub fn tool_input(&self, name: &str) -> Option<&serde_json::Value> {
        self.content.iter().find_map(|c| match c {
            Content::ToolCall {
                name: n, arguments, ..
            } if n == name => Some(arguments),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_total() {
        let usage = Usage {
            input: 1200,
            output: 300,
        };
        assert_eq!(usage.total(), 1500);
    }

    #[test]
    fn test_tool_choice_serialization() {
        assert_eq!(serde_json::to_value(ToolChoice::Auto).unwrap(), json!({"type": "auto"}));
        assert_eq!(
            serde_json::to_value(ToolChoice::tool("generate_summary")).unwrap(),
            json!({"type": "tool", "name": "generate_summary"})
        );
        assert!(ToolChoice::tool("x").is_forced());
        assert!(!ToolChoice::Auto.is_forced());
    }

    #[test]
    fn test_completion_text_joins_blocks() {
        let completion = Completion {
            content: vec![Content::text("Hello, "), Content::text("world")],
            ..Default::default()
        };
        assert_eq!(completion.text(), "Hello, world");
    }

    #[test]
    fn test_completion_tool_input_by_name() {
        let completion = Completion {
            content: vec![
                Content::text("Here you go"),
                Content::tool_call("toolu_1", "other", json!({"a": 1})),
                Content::tool_call("toolu_2", "generate_summary", json!({"text": "hi"})),
            ],
            ..Default::default()
        };
        assert_eq!(
            completion.tool_input("generate_summary"),
            Some(&json!({"text": "hi"}))
        );
        assert!(completion.tool_input("missing").is_none());
    }

    #[test]
    fn test_completion_truncated_on_length() {
        let completion = Completion {
            stop_reason: Some(StopReason::Length),
            ..Default::default()
        };
        assert!(completion.is_truncated());
        assert!(!Completion::default().is_truncated());
    }

    #[test]
    fn test_message_role_and_text() {
        let msg = Message::assistant("ack");
        assert_eq!(msg.role(), "assistant");
        assert_eq!(msg.text(), "ack");
    }
}
