//! Test doubles for command and export tests

use async_trait::async_trait;
use datasight_agent::{Analyst, AnalystConfig, Dataset, Session, SessionLimits};
use datasight_ai::{Completion, Content, LlmProvider, Request, Usage};
use std::sync::Arc;

/// Answers every request with the same text
pub(crate) struct FixedProvider {
    text: String,
}

impl FixedProvider {
    pub(crate) fn text(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for FixedProvider {
    async fn complete(&self, _request: &Request) -> datasight_ai::Result<Completion> {
        Ok(Completion {
            content: vec![Content::text(self.text.clone())],
            usage: Usage {
                input: 40,
                output: 10,
            },
            ..Default::default()
        })
    }
}

pub(crate) fn test_session(provider: Arc<FixedProvider>) -> Session {
    let csv = "city,temp\nOslo,4.5\nRome,18.0\nCairo,27.5\n";
    let dataset = Dataset::from_csv_reader(csv.as_bytes(), b',').unwrap();
    let model = datasight_ai::models::resolve_model("test-model", Some("http://localhost"));
    let analyst = Analyst::new(provider, model, AnalystConfig::default());
    Session::new(Arc::new(dataset), analyst, SessionLimits::default())
}
