//! /history command - list the conversation turns

use super::CommandResult;
use crate::render::describe_chart;
use crate::utils::truncate_chars;
use datasight_agent::{Role, Session};

pub struct HistoryCommand;

impl HistoryCommand {
    pub fn execute(session: &Session) -> CommandResult {
        let turns = session.conversation().turns();
        if turns.is_empty() {
            return CommandResult::Message("No conversation yet.".to_string());
        }

        let mut output = String::new();
        for (i, turn) in turns.iter().enumerate() {
            let who = match turn.role {
                Role::User => "you",
                Role::Assistant => "analyst",
            };
            let preview = truncate_chars(&turn.content.replace('\n', " "), 80);
            output.push_str(&format!("[{}] {}: {}\n", i, who, preview));

            if let Some(chart) = &turn.chart {
                for c in [&chart.chart_1, &chart.chart_2].into_iter().flatten() {
                    output.push_str(&format!("      chart: {}\n", describe_chart(c)));
                }
            }
        }

        CommandResult::Message(output.trim_end().to_string())
    }
}
