//! Analyst: builds requests for the LLM boundary and turns responses into insights.
//!
//! The analyst never mutates conversation state. Callers get an [`Exchange`]
//! back and decide whether to keep it.

use crate::context::DatasetContext;
use crate::conversation::{ConversationTurn, Role};
use crate::failure::{Failure, RequestKind};
use crate::insight::{Insight, SUMMARY_UNAVAILABLE};
use crate::schema::{self, StructuredOutput, TOOL_NAME, ToolVariant};
use datasight_ai::{Completion, Content, LlmProvider, Message, Model, Request, ToolChoice};
use std::sync::Arc;

/// Stand-in for assistant turns that carried no text
const EMPTY_TURN_PLACEHOLDER: &str = "(no text response)";

const PRIMING_ACK: &str = "I understand the dataset and will use the generate_summary tool when you need visualizations. What would you like to know?";

/// Output token caps per request kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalystConfig {
    pub summary_max_tokens: u32,
    pub followup_max_tokens: u32,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            summary_max_tokens: 1500,
            followup_max_tokens: 3000,
        }
    }
}

/// Result of one LLM call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub insight: Insight,
    /// Input plus output tokens; 0 when the call failed
    pub token_delta: u64,
}

impl Exchange {
    fn failed(insight: Insight) -> Self {
        Self {
            insight,
            token_delta: 0,
        }
    }
}

/// Talks to the model on behalf of a session
pub struct Analyst {
    provider: Arc<dyn LlmProvider>,
    model: Model,
    config: AnalystConfig,
}

impl Analyst {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Model, config: AnalystConfig) -> Self {
        Self {
            provider,
            model,
            config,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    /// Initial analysis of a dataset
    pub async fn summarize(&self, context: &DatasetContext) -> Exchange {
        let request = self.summary_request(context);

        tracing::info!("API call started");
        let completion = match self.provider.complete(&request).await {
            Ok(c) => c,
            Err(e) => {
                let failure = Failure::classify(&e);
                return Exchange::failed(Insight::from_failure(failure, RequestKind::Summary));
            }
        };
        tracing::info!("API response successful");

        match completion.tool_input(TOOL_NAME) {
            Some(input) => {
                let mut insight = Insight::from_structured(StructuredOutput::from_tool_input(
                    input,
                    ToolVariant::Summary,
                ));
                mark_truncation(&mut insight, &completion);
                Exchange {
                    insight,
                    token_delta: completion.usage.total(),
                }
            }
            None => {
                tracing::warn!("No tool use found in response");
                Exchange::failed(Insight::error_message(SUMMARY_UNAVAILABLE))
            }
        }
    }

    /// Answer a follow-up question given the prior conversation
    pub async fn ask_followup(
        &self,
        question: &str,
        history: &[ConversationTurn],
        context: &DatasetContext,
        force_tool: bool,
    ) -> Exchange {
        let request = self.followup_request(question, history, context, force_tool);

        let preview: String = question.chars().take(50).collect();
        tracing::info!("API call started - Question: {}", preview);
        tracing::debug!(
            "Follow-up request: {} messages, tool_choice={:?}",
            request.messages.len(),
            request.tool_choice
        );

        match self.provider.complete(&request).await {
            Ok(completion) => {
                tracing::info!("API call successful");
                let mut insight = parse_followup(&completion);
                mark_truncation(&mut insight, &completion);
                Exchange {
                    insight,
                    token_delta: completion.usage.total(),
                }
            }
            Err(e) => {
                let failure = Failure::classify(&e);
                Exchange::failed(Insight::from_failure(failure, RequestKind::FollowUp))
            }
        }
    }

    pub(crate) fn summary_request(&self, context: &DatasetContext) -> Request {
        let mut request = Request::new(self.model.clone(), self.config.summary_max_tokens);
        request.add_tool(schema::tool(ToolVariant::Summary));
        request.tool_choice = Some(ToolChoice::Auto);
        request.push(Message::user(format!(
            "Analyze this dataset summary and provide insights:\n\n{}",
            context
        )));
        request
    }

    pub(crate) fn followup_request(
        &self,
        question: &str,
        history: &[ConversationTurn],
        context: &DatasetContext,
        force_tool: bool,
    ) -> Request {
        let mut request = Request::new(self.model.clone(), self.config.followup_max_tokens);
        request.add_tool(schema::tool(ToolVariant::FollowUp));
        request.tool_choice = Some(if force_tool {
            ToolChoice::tool(TOOL_NAME)
        } else {
            ToolChoice::Auto
        });

        request.push(Message::user(priming_message(context)));
        request.push(Message::assistant(PRIMING_ACK));

        for turn in history {
            let content = if turn.content.trim().is_empty() {
                EMPTY_TURN_PLACEHOLDER
            } else {
                turn.content.as_str()
            };
            request.push(match turn.role {
                Role::User => Message::user(content),
                Role::Assistant => Message::assistant(content),
            });
        }

        request.push(Message::user(question));
        request
    }
}

fn priming_message(context: &DatasetContext) -> String {
    format!(
        "{}\n\n\
You have access to a tool called 'generate_summary' that can create visualizations.\n\
When the user asks for charts or plots, you MUST use the generate_summary tool to return executable matplotlib code.\n\n\
Please help me analyze this data.",
        context
    )
}

fn mark_truncation(insight: &mut Insight, completion: &Completion) {
    if !completion.is_truncated() {
        return;
    }
    insight.truncated = true;
    if insight.generated_code.is_some() {
        tracing::warn!("Response hit the output token cap; generated code may be incomplete");
    } else {
        tracing::warn!("Response hit the output token cap");
    }
}

/// Text blocks accumulate; a tool invocation replaces the text so far
fn parse_followup(completion: &Completion) -> Insight {
    let mut insight = Insight::default();
    for block in &completion.content {
        match block {
            Content::Text { text } => insight.text.push_str(text),
            Content::ToolCall {
                name, arguments, ..
            } if name == TOOL_NAME => {
                let output = StructuredOutput::from_tool_input(arguments, ToolVariant::FollowUp);
                insight = Insight {
                    next_steps: None,
                    ..Insight::from_structured(output)
                };
            }
            Content::ToolCall { name, .. } => {
                tracing::warn!("Ignoring call to unknown tool '{}'", name);
            }
        }
    }
    insight
}
