//! Slash commands for interactive mode

mod history;
mod status;

pub use history::HistoryCommand;
pub use status::StatusCommand;

use datasight_agent::Session;
use std::path::PathBuf;

/// Result of executing a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Run the initial analysis again
    Analyze,
    /// Write the conversation to a JSONL file
    Export(PathBuf),
    /// Show a message to the user (not sent to the model)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, session: &Session) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "analyze" | "a" => CommandResult::Analyze,

        "status" | "s" => StatusCommand::execute(session),

        "history" => HistoryCommand::execute(session),

        "clear" | "c" => CommandResult::Clear,

        "export" | "e" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /export <path>".to_string())
            } else {
                CommandResult::Export(PathBuf::from(args))
            }
        }

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /analyze, /a         Run the initial dataset analysis
  /status, /s          Show turn and token usage
  /history             Show the conversation so far
  /clear, /c           Clear conversation history
  /export, /e <path>   Save the conversation as JSONL
  /quit, /exit, /q     Exit datasight

Anything else is sent to the analyst as a question, e.g.
  What drives the differences between regions?
  Create a scatter plot of price vs units"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedProvider, test_session};

    #[test]
    fn test_not_a_command() {
        let session = test_session(FixedProvider::text("ok"));
        assert!(execute_command("what is the mean?", &session).is_none());
    }

    #[test]
    fn test_basic_commands() {
        let session = test_session(FixedProvider::text("ok"));
        assert_eq!(execute_command("/clear", &session), Some(CommandResult::Clear));
        assert_eq!(execute_command("/Q", &session), Some(CommandResult::Exit));
        assert_eq!(execute_command("/analyze", &session), Some(CommandResult::Analyze));
        assert_eq!(
            execute_command("/frobnicate", &session),
            Some(CommandResult::Unknown("frobnicate".into()))
        );
        assert!(matches!(
            execute_command("/help", &session),
            Some(CommandResult::Message(m)) if m.contains("/export")
        ));
    }

    #[test]
    fn test_export_needs_path() {
        let session = test_session(FixedProvider::text("ok"));
        assert_eq!(
            execute_command("/export  out/chat.jsonl ", &session),
            Some(CommandResult::Export(PathBuf::from("out/chat.jsonl")))
        );
        assert_eq!(
            execute_command("/export", &session),
            Some(CommandResult::Message("Usage: /export <path>".into()))
        );
    }
}
