//! Conversation state: alternating turns, chart records and token usage.

use crate::insight::Insight;
use crate::schema::ChartDescriptor;
use serde::{Deserialize, Serialize};

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Chart data produced by one exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub source_question: String,
    pub generated_code: Option<String>,
    pub chart_1: Option<ChartDescriptor>,
    pub chart_2: Option<ChartDescriptor>,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Only ever set on assistant turns
    pub chart: Option<ChartRecord>,
    /// Unix time in milliseconds when the turn was recorded
    pub timestamp: i64,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            chart: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn assistant(content: impl Into<String>, chart: Option<ChartRecord>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            chart,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Turns and token usage of one session.
///
/// Turns are only added in user/assistant pairs, so roles alternate and the
/// length stays even.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    turns: Vec<ConversationTurn>,
    token_count: u64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Completed exchanges
    pub fn turn_count(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn token_count(&self) -> u64 {
        self.token_count
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Record a successful exchange
    pub fn push_exchange(&mut self, question: &str, insight: &Insight, tokens: u64) {
        let chart = insight.has_chart().then(|| ChartRecord {
            source_question: question.to_string(),
            generated_code: insight.generated_code.clone(),
            chart_1: insight.chart_1.clone(),
            chart_2: insight.chart_2.clone(),
        });

        self.turns.push(ConversationTurn::user(question));
        self.turns
            .push(ConversationTurn::assistant(insight.text.clone(), chart));
        self.token_count += tokens;
    }

    /// Chart records in conversation order
    pub fn charts(&self) -> impl Iterator<Item = &ChartRecord> {
        self.turns.iter().filter_map(|t| t.chart.as_ref())
    }

    /// Clear all turns and the token counter
    pub fn reset(&mut self) {
        self.turns.clear();
        self.token_count = 0;
    }
}
