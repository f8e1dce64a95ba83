//! The single result type returned for every analysis request

use crate::failure::{Failure, RequestKind};
use crate::schema::{ChartDescriptor, StructuredOutput};
use serde::{Deserialize, Serialize};

/// Message used when the initial analysis comes back without the tool
pub const SUMMARY_UNAVAILABLE: &str = "⚠️ Unable to generate summary. Please try again.";

/// Result of a summary or follow-up request.
///
/// Every field is always serialized, `null` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,
    pub next_steps: Option<String>,
    pub chart_1: Option<ChartDescriptor>,
    pub chart_2: Option<ChartDescriptor>,
    pub generated_code: Option<String>,
    /// Set when the LLM boundary failed
    pub failure: Option<Failure>,
    pub error: bool,
    /// The model stopped at the output token cap, so code may be cut off
    pub truncated: bool,
}

impl Insight {
    /// Plain text answer with no chart
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Insight built from a parsed tool invocation
    pub fn from_structured(output: StructuredOutput) -> Self {
        Self {
            text: output.text.unwrap_or_default(),
            next_steps: output.next_steps,
            chart_1: output.chart_1,
            chart_2: output.chart_2,
            generated_code: output.generated_code,
            failure: None,
            error: false,
            truncated: false,
        }
    }

    /// Error insight for a classified boundary failure
    pub fn from_failure(failure: Failure, kind: RequestKind) -> Self {
        Self {
            text: failure.message(kind),
            failure: Some(failure),
            error: true,
            ..Default::default()
        }
    }

    /// Error insight that is not tied to a boundary failure
    pub fn error_message(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: true,
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn has_chart(&self) -> bool {
        self.chart_1.is_some() || self.chart_2.is_some() || self.generated_code.is_some()
    }
}
