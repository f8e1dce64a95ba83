//! Classification of LLM boundary failures into user-facing messages

use serde::{Deserialize, Serialize};

/// Which request failed; some messages differ between the two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Summary,
    FollowUp,
}

/// Broad failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Connectivity,
    RateLimit,
    Status,
    Unclassified,
}

/// A classified LLM boundary failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Connect error or timeout
    Connectivity,
    /// HTTP 429 or a rate-limit error type
    RateLimit,
    /// HTTP 400
    BadRequest,
    /// HTTP 401
    Auth,
    /// HTTP 5xx
    ServiceUnavailable,
    /// Any other HTTP status
    Status { code: u16 },
    /// Everything else; keeps the raw error text
    Unclassified { raw: String },
}

impl Failure {
    /// Classify a boundary error, logging it at the matching level
    pub fn classify(error: &datasight_ai::Error) -> Self {
        if error.is_connectivity() {
            tracing::error!("Connection error: {}", error);
            return Failure::Connectivity;
        }
        if error.is_rate_limit() {
            tracing::warn!("Rate limit hit: {}", error);
            return Failure::RateLimit;
        }
        if let Some(code) = error.status() {
            tracing::error!("API status error {}: {}", code, error);
            return match code {
                400 => Failure::BadRequest,
                401 => Failure::Auth,
                c if c >= 500 => Failure::ServiceUnavailable,
                c => Failure::Status { code: c },
            };
        }
        tracing::error!("Unexpected error: {}", error);
        Failure::Unclassified {
            raw: error.to_string(),
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            Failure::Connectivity => FailureCategory::Connectivity,
            Failure::RateLimit => FailureCategory::RateLimit,
            Failure::BadRequest
            | Failure::Auth
            | Failure::ServiceUnavailable
            | Failure::Status { .. } => FailureCategory::Status,
            Failure::Unclassified { .. } => FailureCategory::Unclassified,
        }
    }

    /// Message shown to the user
    pub fn message(&self, kind: RequestKind) -> String {
        match self {
            Failure::Connectivity => "⚠️ Connection error: Unable to reach the AI service. Please check your internet connection and try again.".to_string(),
            Failure::RateLimit => "⚠️ Rate limit reached: Too many requests. Please wait a moment and try again.".to_string(),
            Failure::BadRequest => match kind {
                RequestKind::Summary => "⚠️ Invalid request: There was an issue analyzing this dataset. Please try a different dataset.".to_string(),
                RequestKind::FollowUp => "⚠️ Invalid request: There was an issue with the request format. Please try rephrasing your question.".to_string(),
            },
            Failure::Auth => match kind {
                RequestKind::Summary => "⚠️ Authentication error: API key is invalid. Please check your configuration.".to_string(),
                RequestKind::FollowUp => "⚠️ Authentication error: API key is invalid. Please contact support.".to_string(),
            },
            Failure::ServiceUnavailable => "⚠️ Service temporarily unavailable: The AI service is experiencing issues. Please try again in a few moments.".to_string(),
            Failure::Status { code } => format!("⚠️ Error {}: An unexpected error occurred. Please try again.", code),
            Failure::Unclassified { raw } => format!("⚠️ Unexpected error: {}. Please try again or contact support if the issue persists.", raw),
        }
    }
}
