//! /status command - show model, dataset and budget usage

use super::CommandResult;
use crate::render::{limit_notice, status_line};
use datasight_agent::Session;

pub struct StatusCommand;

impl StatusCommand {
    pub fn execute(session: &Session) -> CommandResult {
        let dataset = session.dataset();
        let model = session.analyst().model();

        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("Model:      {}\n", model.id));
        output.push_str(&format!(
            "Dataset:    {} rows, {} columns\n",
            dataset.n_rows(),
            dataset.n_cols()
        ));
        output.push_str(&format!(
            "Analysis:   {}\n",
            if session.analysis().is_some() {
                "done"
            } else {
                "not run (use /analyze)"
            }
        ));
        output.push_str(&format!(
            "Charts:     {}\n",
            session.conversation().charts().count()
        ));
        output.push('\n');
        output.push_str(&status_line(session));

        if let Some(notice) = limit_notice(session) {
            output.push('\n');
            output.push_str(&notice);
        }

        CommandResult::Message(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedProvider, test_session};

    #[tokio::test]
    async fn test_status_reports_usage() {
        let mut session = test_session(FixedProvider::text("ok"));
        session.ask("first question").await.unwrap();

        let CommandResult::Message(text) = StatusCommand::execute(&session) else {
            panic!("expected a message");
        };
        assert!(text.contains("Dataset:    3 rows, 2 columns"));
        assert!(text.contains("Conversation turns: 1/10 | Tokens: 50/25000"));
        assert!(!text.contains("⚠️"));
    }
}
