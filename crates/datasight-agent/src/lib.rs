//! datasight-agent: dataset analysis conversations
//!
//! This crate turns a loaded dataset into prompt context, decides when a
//! follow-up needs a chart, runs the LLM round trip and keeps the bounded
//! per-session conversation.

pub mod analyst;
pub mod context;
pub mod conversation;
pub mod dataset;
pub mod error;
pub mod failure;
pub mod insight;
pub mod intent;
pub mod schema;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use analyst::{Analyst, AnalystConfig, Exchange};
pub use context::{ContextOptions, DatasetContext, build_context};
pub use conversation::{ChartRecord, ConversationState, ConversationTurn, Role};
pub use dataset::{DType, DataColumn, Dataset, Describe};
pub use error::{Error, Result};
pub use failure::{Failure, FailureCategory, RequestKind};
pub use insight::Insight;
pub use intent::{IntentClassifier, KeywordIntent, wants_visualization};
pub use schema::{ChartDescriptor, ChartType, StructuredOutput, ToolVariant};
pub use session::{LimitStatus, Session, SessionLimits};
