//! LLM Provider implementations

pub mod anthropic;

use crate::{Completion, Error, Request, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// One call is one request/response round trip. Implementations are
/// read-only after construction and may be shared across sessions.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the complete response
    async fn complete(&self, request: &Request) -> Result<Completion>;
}

/// Get an API key from a provided value or the environment
pub fn get_api_key(provided: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = provided {
        return Ok(key.to_string());
    }

    std::env::var(env_var).map_err(|_| Error::InvalidApiKey)
}
