//! datasight-ai: LLM messages boundary
//!
//! This crate provides the request/response types the analysis layer speaks,
//! a provider trait, and the Anthropic Messages API implementation of it.

pub mod error;
pub mod models;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use providers::LlmProvider;
pub use types::*;
