//! JSONL export of a conversation

use datasight_agent::{ChartRecord, Role, Session};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Transcript entry types for JSONL format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// Transcript metadata, always the first line
    Metadata {
        id: String,
        exported_at: i64,
        model: String,
        dataset: String,
        rows: usize,
        columns: usize,
        turns: usize,
        tokens: u64,
    },
    /// One conversation turn
    Turn {
        role: Role,
        content: String,
        chart: Option<ChartRecord>,
        timestamp: i64,
    },
}

/// Write the session's conversation to `path`, returning the transcript id
pub fn export(path: &Path, session: &Session, dataset_name: &str) -> std::io::Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp_millis();
    let conversation = session.conversation();

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);

    let metadata = TranscriptEntry::Metadata {
        id: id.clone(),
        exported_at: now,
        model: session.analyst().model().id.clone(),
        dataset: dataset_name.to_string(),
        rows: session.dataset().n_rows(),
        columns: session.dataset().n_cols(),
        turns: conversation.turn_count(),
        tokens: conversation.token_count(),
    };
    writeln!(writer, "{}", serde_json::to_string(&metadata)?)?;

    for turn in conversation.turns() {
        let entry = TranscriptEntry::Turn {
            role: turn.role,
            content: turn.content.clone(),
            chart: turn.chart.clone(),
            timestamp: turn.timestamp,
        };
        writeln!(writer, "{}", serde_json::to_string(&entry)?)?;
    }

    writer.flush()?;
    Ok(id)
}
