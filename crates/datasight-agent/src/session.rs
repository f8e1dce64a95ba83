//! One analysis session over one dataset

use crate::analyst::Analyst;
use crate::context::{ContextOptions, DatasetContext, build_context};
use crate::conversation::ConversationState;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::insight::Insight;
use crate::intent::{IntentClassifier, KeywordIntent};
use std::sync::Arc;

/// Turn and token budget of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_turns: usize,
    /// `None` disables the token cap
    pub max_tokens: Option<u64>,
    pub warn_turns: usize,
    pub warn_tokens: Option<u64>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_tokens: Some(25_000),
            warn_turns: 8,
            warn_tokens: Some(20_000),
        }
    }
}

impl SessionLimits {
    /// Limits with warnings at 80% of each cap
    pub fn with_caps(max_turns: usize, max_tokens: Option<u64>) -> Self {
        Self {
            max_turns,
            max_tokens,
            warn_turns: max_turns * 4 / 5,
            warn_tokens: max_tokens.map(|t| t * 4 / 5),
        }
    }

    pub fn status(&self, turns: usize, tokens: u64) -> LimitStatus {
        let over = |cap: Option<u64>| cap.is_some_and(|c| tokens >= c);
        if turns >= self.max_turns || over(self.max_tokens) {
            LimitStatus::Reached
        } else if turns >= self.warn_turns || over(self.warn_tokens) {
            LimitStatus::NearlyReached
        } else {
            LimitStatus::Ok
        }
    }
}

/// Where a session stands against its limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStatus {
    Ok,
    NearlyReached,
    Reached,
}

/// Owns the conversation for one dataset.
///
/// `ask` takes `&mut self`, so follow-ups on a session never overlap.
pub struct Session {
    dataset: Arc<Dataset>,
    analyst: Analyst,
    limits: SessionLimits,
    context_options: ContextOptions,
    classifier: Box<dyn IntentClassifier>,
    conversation: ConversationState,
    analysis: Option<Insight>,
}

impl Session {
    pub fn new(dataset: Arc<Dataset>, analyst: Analyst, limits: SessionLimits) -> Self {
        Self {
            dataset,
            analyst,
            limits,
            context_options: ContextOptions::default(),
            classifier: Box::new(KeywordIntent),
            conversation: ConversationState::new(),
            analysis: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_context_options(mut self, options: ContextOptions) -> Self {
        self.context_options = options;
        self
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn analyst(&self) -> &Analyst {
        &self.analyst
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Last successful initial analysis
    pub fn analysis(&self) -> Option<&Insight> {
        self.analysis.as_ref()
    }

    pub fn context(&self) -> DatasetContext {
        build_context(&self.dataset, &self.context_options)
    }

    pub fn limit_status(&self) -> LimitStatus {
        self.limits
            .status(self.conversation.turn_count(), self.conversation.token_count())
    }

    /// Run the initial analysis. Its tokens do not count against the budget.
    pub async fn analyze(&mut self) -> Insight {
        let exchange = self.analyst.summarize(&self.context()).await;
        if !exchange.insight.is_error() {
            self.analysis = Some(exchange.insight.clone());
        }
        exchange.insight
    }

    /// Ask a follow-up question.
    ///
    /// History only changes when the call succeeds; failures come back as
    /// an error insight with the conversation untouched.
    pub async fn ask(&mut self, question: &str) -> Result<Insight> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        if self.limit_status() == LimitStatus::Reached {
            tracing::warn!(
                "Conversation limit reached: {} turns, {} tokens",
                self.conversation.turn_count(),
                self.conversation.token_count()
            );
            return Err(Error::LimitExceeded {
                turns: self.conversation.turn_count(),
                tokens: self.conversation.token_count(),
            });
        }

        let context = self.context();
        let force_tool = self.classifier.wants_visualization(question);
        tracing::debug!("Visualization intent: {}", force_tool);

        let exchange = self
            .analyst
            .ask_followup(question, self.conversation.turns(), &context, force_tool)
            .await;

        if !exchange.insight.is_error() {
            self.conversation
                .push_exchange(question, &exchange.insight, exchange.token_delta);
        }
        Ok(exchange.insight)
    }

    /// Start the conversation over. The initial analysis is kept.
    pub fn reset(&mut self) {
        self.conversation.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyst::AnalystConfig;
    use crate::conversation::Role;
    use crate::test_support::{MockProvider, test_model, text_completion, tool_completion};
    use datasight_ai::ToolChoice;
    use serde_json::json;

    fn dataset() -> Arc<Dataset> {
        let csv = "city,temp\nOslo,4.5\nRome,18.0\nCairo,27.5\n";
        Arc::new(Dataset::from_csv_reader(csv.as_bytes(), b',').unwrap())
    }

    fn session(provider: Arc<MockProvider>) -> Session {
        let analyst = Analyst::new(provider, test_model(), AnalystConfig::default());
        Session::new(dataset(), analyst, SessionLimits::default())
    }

    fn fill(session: &mut Session, exchanges: usize, tokens_each: u64) {
        for i in 0..exchanges {
            session.conversation.push_exchange(
                &format!("q{}", i),
                &Insight::text(format!("a{}", i)),
                tokens_each,
            );
        }
    }

    #[test]
    fn test_limit_status() {
        let limits = SessionLimits::default();
        assert_eq!(limits.status(0, 0), LimitStatus::Ok);
        assert_eq!(limits.status(8, 0), LimitStatus::NearlyReached);
        assert_eq!(limits.status(2, 20_000), LimitStatus::NearlyReached);
        assert_eq!(limits.status(9, 21_000), LimitStatus::NearlyReached);
        assert_eq!(limits.status(10, 0), LimitStatus::Reached);
        assert_eq!(limits.status(1, 25_000), LimitStatus::Reached);
    }

    #[test]
    fn test_with_caps_derives_warnings() {
        assert_eq!(SessionLimits::with_caps(10, Some(25_000)), SessionLimits::default());

        let limits = SessionLimits::with_caps(20, None);
        assert_eq!(limits.warn_turns, 16);
        assert_eq!(limits.warn_tokens, None);
        assert_eq!(limits.status(8, 0), LimitStatus::Ok);
        assert_eq!(limits.status(1, 20_000), LimitStatus::Ok);
        assert_eq!(limits.status(16, 0), LimitStatus::NearlyReached);
    }

    #[test]
    fn test_no_token_cap() {
        let limits = SessionLimits {
            max_turns: 20,
            max_tokens: None,
            warn_turns: 18,
            warn_tokens: None,
        };
        assert_eq!(limits.status(10, 1_000_000), LimitStatus::Ok);
        assert_eq!(limits.status(20, 0), LimitStatus::Reached);
    }

    #[tokio::test]
    async fn test_ask_appends_exchange() {
        let provider = MockProvider::new(vec![Ok(text_completion("Cairo is warmest.", 900, 100))]);
        let mut session = session(provider.clone());

        let insight = session.ask("  Which city is warmest?  ").await.unwrap();
        assert_eq!(insight.text, "Cairo is warmest.");

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "Which city is warmest?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(session.conversation().token_count(), 1000);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_question_rejected_without_call() {
        let provider = MockProvider::new(vec![]);
        let mut session = session(provider.clone());
        assert!(matches!(session.ask("   ").await, Err(Error::EmptyQuestion)));
        assert_eq!(provider.calls(), 0);
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_nearly_reached_still_allows_a_call() {
        let provider = MockProvider::new(vec![Ok(text_completion("ok", 1, 1))]);
        let mut session = session(provider.clone());
        fill(&mut session, 8, 0);
        session.conversation.push_exchange("q8", &Insight::text("a8"), 21_000);

        assert_eq!(session.conversation().turns().len(), 18);
        assert_eq!(session.limit_status(), LimitStatus::NearlyReached);
        assert!(session.ask("one more").await.is_ok());
        assert_eq!(provider.calls(), 1);
        assert_eq!(session.limit_status(), LimitStatus::Reached);
    }

    #[tokio::test]
    async fn test_limit_reached_blocks_until_reset() {
        let provider = MockProvider::new(vec![]);
        let mut session = session(provider.clone());
        fill(&mut session, 10, 100);

        let result = session.ask("another question").await;
        assert!(matches!(
            result,
            Err(Error::LimitExceeded { turns: 10, tokens: 1000 })
        ));
        assert_eq!(provider.calls(), 0);

        session.reset();
        assert_eq!(session.limit_status(), LimitStatus::Ok);
        assert!(session.ask("another question").await.is_ok());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_followup_leaves_history_untouched() {
        let provider = MockProvider::new(vec![
            Ok(text_completion("first", 10, 10)),
            Err(datasight_ai::Error::api(503, "overloaded_error", "busy")),
        ]);
        let mut session = session(provider);
        session.ask("first").await.unwrap();

        let insight = session.ask("second").await.unwrap();
        assert!(insight.is_error());
        assert_eq!(session.conversation().turns().len(), 2);
        assert_eq!(session.conversation().token_count(), 20);
    }

    #[tokio::test]
    async fn test_visualization_question_forces_tool() {
        let provider = MockProvider::new(vec![Ok(tool_completion(
            json!({
                "text": "Temperatures by city",
                "chart_1": {"type": "bar", "x": "city", "y": "temp"},
                "chart_2": null,
                "matplotlib_code": "fig, ax = plt.subplots()\nax.bar(df['city'], df['temp'])"
            }),
            10,
            10,
        ))]);
        let mut session = session(provider.clone());
        session.ask("Create a bar chart of temp by city").await.unwrap();

        assert_eq!(
            provider.last_request().unwrap().tool_choice,
            Some(ToolChoice::tool("generate_summary"))
        );
        let record = session.conversation().turns()[1].chart.as_ref().unwrap();
        assert_eq!(record.source_question, "Create a bar chart of temp by city");
        assert!(record.generated_code.is_some());
    }

    #[tokio::test]
    async fn test_history_is_replayed() {
        let provider = MockProvider::new(vec![
            Ok(text_completion("a1", 1, 1)),
            Ok(text_completion("a2", 1, 1)),
        ]);
        let mut session = session(provider.clone());
        session.ask("q1").await.unwrap();
        session.ask("q2").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].messages.len(), 3);
        let texts: Vec<String> = requests[1].messages.iter().map(|m| m.text()).collect();
        assert_eq!(&texts[2..], &["q1", "a1", "q2"]);
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        struct Always;
        impl IntentClassifier for Always {
            fn wants_visualization(&self, _question: &str) -> bool {
                true
            }
        }

        let provider = MockProvider::new(vec![]);
        let mut session = session(provider.clone()).with_classifier(Box::new(Always));
        session.ask("hello").await.unwrap();
        assert!(provider.last_request().unwrap().tool_choice.unwrap().is_forced());
    }

    #[tokio::test]
    async fn test_analyze_stores_only_success() {
        let provider = MockProvider::new(vec![
            Err(datasight_ai::Error::Connection("refused".into())),
            Ok(tool_completion(
                json!({
                    "text": "Three cities",
                    "next_steps": "Add more cities",
                    "chart_1": {"type": "bar", "x": "city", "y": "temp"},
                    "matplotlib_code": "fig, ax = plt.subplots()"
                }),
                500,
                500,
            )),
        ]);
        let mut session = session(provider);

        let failed = session.analyze().await;
        assert!(failed.is_error());
        assert!(session.analysis().is_none());

        let ok = session.analyze().await;
        assert!(!ok.is_error());
        assert_eq!(session.analysis().unwrap().text, "Three cities");
        // Initial analysis tokens are not part of the follow-up budget
        assert_eq!(session.conversation().token_count(), 0);
    }
}
