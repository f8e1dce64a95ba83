//! Anthropic Claude Messages API provider

use crate::{
    error::{Error, Result},
    providers::LlmProvider,
    types::{Completion, Content, Message, Request, StopReason, Tool, ToolChoice, Usage},
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a provider whose requests give up after `timeout`
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| Error::InvalidApiKey)?,
        );
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        Ok(headers)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: &Request) -> Result<Completion> {
        let body = build_request(request);
        let url = format!("{}/v1/messages", request.model.base_url);

        tracing::debug!("Anthropic API URL: {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status.as_u16(), &body, retry_after));
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

/// Map a non-success HTTP response onto a typed error
pub(crate) fn error_from_status(status: u16, body: &str, retry_after: Option<u64>) -> Error {
    if status == 429 {
        return Error::RateLimited { retry_after };
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.error_type == "rate_limit_error" => {
            Error::RateLimited { retry_after }
        }
        Ok(envelope) => Error::api(status, envelope.error.error_type, envelope.error.message),
        Err(_) => {
            let message = if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            };
            Error::api(status, "http_error", message)
        }
    }
}

/// Parse a successful Messages API response body
pub(crate) fn parse_response(body: &str) -> Result<Completion> {
    let response: MessagesResponse = serde_json::from_str(body)?;

    if response.response_type.as_deref() == Some("error") {
        return Err(Error::UnexpectedResponse(format!(
            "error object in success response: {}",
            body
        )));
    }

    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(Content::Text { text }),
            ResponseBlock::ToolUse { id, name, input } => Some(Content::ToolCall {
                id,
                name,
                arguments: input,
            }),
            ResponseBlock::Other => None,
        })
        .collect();

    Ok(Completion {
        content,
        usage: Usage {
            input: response.usage.input_tokens,
            output: response.usage.output_tokens,
        },
        stop_reason: response.stop_reason.as_deref().map(map_stop_reason),
        model: response.model,
    })
}

fn build_request(request: &Request) -> AnthropicRequest {
    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(convert_tools(&request.tools))
    };

    // tool_choice is meaningless without tools
    let tool_choice = tools.as_ref().and(request.tool_choice.clone());

    AnthropicRequest {
        model: request.model.id.clone(),
        messages: convert_messages(&request.messages),
        max_tokens: request.max_tokens.min(request.model.max_tokens),
        stream: false,
        tools,
        tool_choice,
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(rename = "type")]
    response_type: Option<String>,
    #[serde(default)]
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    model: Option<String>,
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// ============================================================================
// Conversion functions
// ============================================================================

fn convert_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
    let mut result = vec![];

    for message in messages {
        let blocks: Vec<serde_json::Value> = message
            .content()
            .iter()
            .filter_map(|c| match c {
                // The API rejects empty text blocks
                Content::Text { text } if text.is_empty() => None,
                Content::Text { text } => {
                    Some(serde_json::json!({ "type": "text", "text": text }))
                }
                Content::ToolCall {
                    id,
                    name,
                    arguments,
                } => Some(serde_json::json!({
                    "type": "tool_use",
                    "id": id,
                    "name": name,
                    "input": arguments
                })),
            })
            .collect();

        if !blocks.is_empty() {
            result.push(AnthropicMessage {
                role: message.role().to_string(),
                content: serde_json::Value::Array(blocks),
            });
        }
    }

    result
}

fn convert_tools(tools: &[Tool]) -> Vec<AnthropicTool> {
    tools
        .iter()
        .map(|tool| {
            let input_schema = if tool.parameters.is_object() {
                let mut schema = tool.parameters.clone();
                if let Some(obj) = schema.as_object_mut() {
                    obj.entry("type").or_insert(serde_json::json!("object"));
                }
                schema
            } else {
                serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                })
            };

            AnthropicTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema,
            }
        })
        .collect()
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "max_tokens" => StopReason::Length,
        "tool_use" => StopReason::ToolUse,
        _ => StopReason::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resolve_model;
    use serde_json::json;

    fn test_request() -> Request {
        let mut request = Request::new(resolve_model("claude-sonnet-4-20250514", None), 3000);
        request.add_tool(Tool::new(
            "generate_summary",
            "Summarize",
            json!({"properties": {"text": {"type": "string"}}}),
        ));
        request.push(Message::user("context"));
        request.push(Message::assistant("ack"));
        request.push(Message::user("plot another chart"));
        request
    }

    #[test]
    fn test_build_request_forced_tool() {
        let mut request = test_request();
        request.tool_choice = Some(ToolChoice::tool("generate_summary"));

        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(body["tool_choice"], json!({"type": "tool", "name": "generate_summary"}));
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["max_tokens"], json!(3000));
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["role"], json!("assistant"));
        // Missing schema type is filled in
        assert_eq!(body["tools"][0]["input_schema"]["type"], json!("object"));
    }

    #[test]
    fn test_build_request_auto_tool_choice() {
        let mut request = test_request();
        request.tool_choice = Some(ToolChoice::Auto);

        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(body["tool_choice"], json!({"type": "auto"}));
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_build_request_drops_tool_choice_without_tools() {
        let mut request = Request::new(resolve_model("claude-sonnet-4-20250514", None), 100);
        request.push(Message::user("hi"));
        request.tool_choice = Some(ToolChoice::Auto);

        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_build_request_clamps_max_tokens() {
        let mut request = Request::new(resolve_model("claude-3-haiku-20240307", None), 10_000);
        request.push(Message::user("hi"));
        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(body["max_tokens"], json!(4096));
    }

    #[test]
    fn test_convert_messages_skips_empty_text() {
        let messages = vec![Message::user("question"), Message::assistant("")];
        let converted = convert_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");
    }

    #[test]
    fn test_parse_response_text_and_tool_use() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "text", "text": "Here is a chart."},
                {"type": "tool_use", "id": "toolu_01", "name": "generate_summary",
                 "input": {"text": "Petal length separates species", "chart_2": null}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 812, "output_tokens": 95}
        }"#;

        let completion = parse_response(body).unwrap();
        assert_eq!(completion.content.len(), 2);
        assert_eq!(completion.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(completion.usage.total(), 907);
        let input = completion.tool_input("generate_summary").unwrap();
        assert_eq!(input["chart_2"], serde_json::Value::Null);
    }

    #[test]
    fn test_parse_response_ignores_unknown_blocks() {
        let body = r#"{
            "type": "message",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "ok"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 2}
        }"#;
        let completion = parse_response(body).unwrap();
        assert_eq!(completion.content, vec![Content::text("ok")]);
        assert_eq!(completion.stop_reason, Some(StopReason::Stop));
    }

    #[test]
    fn test_parse_response_malformed_json() {
        assert!(matches!(parse_response("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_error_from_status_auth() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        match error_from_status(401, body, None) {
            Error::Api {
                status,
                error_type,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(error_type, "authentication_error");
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_from_status_rate_limit() {
        let e = error_from_status(429, "", Some(30));
        assert!(matches!(e, Error::RateLimited { retry_after: Some(30) }));
    }

    #[test]
    fn test_error_from_status_overloaded() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let e = error_from_status(529, body, None);
        assert_eq!(e.status(), Some(529));
        assert!(!e.is_rate_limit());
    }

    #[test]
    fn test_error_from_status_plain_body() {
        let e = error_from_status(502, "Bad Gateway", None);
        match e {
            Error::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
