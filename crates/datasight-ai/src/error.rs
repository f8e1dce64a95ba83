//! Error types for datasight-ai

use thiserror::Error;

/// Result type alias using datasight-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to an LLM provider
#[derive(Error, Debug)]
pub enum Error {
    /// The service could not be reached (connect failure or timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP request failed for another transport reason
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned a non-success status
    #[error("API error {status}: {message} (type: {error_type})")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::Connection(e.to_string())
        } else {
            Error::Http(e)
        }
    }
}

impl Error {
    /// Create an API error from status, type and message
    pub fn api(status: u16, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// HTTP status code associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::RateLimited { .. } => Some(429),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a rate-limit signal
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::Api {
                status,
                error_type,
                message,
            } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                *status == 429
                    || et.contains("rate_limit")
                    || msg.contains("rate limit")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }

    /// Check if this error means the service was never reached
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_api_variant() {
        assert_eq!(Error::api(401, "authentication_error", "bad key").status(), Some(401));
        assert_eq!(Error::RateLimited { retry_after: None }.status(), Some(429));
        assert_eq!(Error::InvalidApiKey.status(), None);
    }

    #[test]
    fn test_rate_limit_typed_variant() {
        assert!(Error::RateLimited { retry_after: Some(5) }.is_rate_limit());
    }

    #[test]
    fn test_rate_limit_api_error_type() {
        let e = Error::api(400, "rate_limit_error", "You have exceeded the rate limit");
        assert!(e.is_rate_limit());
    }

    #[test]
    fn test_rate_limit_api_too_many_requests() {
        let e = Error::api(503, "error", "Too many requests");
        assert!(e.is_rate_limit());
    }

    #[test]
    fn test_not_rate_limit_auth() {
        let e = Error::api(401, "authentication_error", "Invalid API key");
        assert!(!e.is_rate_limit());
    }

    #[test]
    fn test_connectivity() {
        assert!(Error::Connection("dns failure".into()).is_connectivity());
        assert!(!Error::InvalidApiKey.is_connectivity());
        assert!(!Error::api(500, "api_error", "boom").is_connectivity());
    }
}
