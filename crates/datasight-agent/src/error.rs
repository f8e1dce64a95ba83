//! Error types for datasight-agent

use thiserror::Error;

/// Result type alias using datasight-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading data or driving a session
///
/// LLM boundary failures are not in here: the analyst turns them into an
/// error [`Insight`](crate::Insight) so the caller always has a message to show.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the dataset failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV could not be read into a frame
    #[error("Data error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// The dataset has no usable shape
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// The question was empty after trimming
    #[error("Question is empty")]
    EmptyQuestion,

    /// The session turn or token budget is used up
    #[error("Conversation limit reached ({turns} turns, {tokens} tokens). Clear the chat history to start fresh.")]
    LimitExceeded { turns: usize, tokens: u64 },
}
