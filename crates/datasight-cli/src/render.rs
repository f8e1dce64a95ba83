//! Plain-text rendering of insights and session status

use datasight_agent::{ChartDescriptor, Insight, LimitStatus, Session};
use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\n?(.*?)```").unwrap());

/// A run of prose or a fenced code block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(String),
    Code { lang: Option<String>, code: String },
}

/// Split text into prose and fenced code blocks, in order
pub fn split_code_blocks(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in CODE_BLOCK.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let prose = text[last..whole.start()].trim();
        if !prose.is_empty() {
            segments.push(Segment::Prose(prose.to_string()));
        }
        let lang = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let code = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        segments.push(Segment::Code {
            lang,
            code: code.trim_end().to_string(),
        });
        last = whole.end();
    }

    let rest = text[last..].trim();
    if !rest.is_empty() {
        segments.push(Segment::Prose(rest.to_string()));
    }
    segments
}

/// Generated code without a surrounding fence
pub fn extract_code(code: &str) -> String {
    let trimmed = code.trim();
    match split_code_blocks(trimmed).as_slice() {
        [Segment::Code { code, .. }] => code.clone(),
        _ => trimmed.to_string(),
    }
}

pub fn describe_chart(chart: &ChartDescriptor) -> String {
    match &chart.y {
        Some(y) => format!("{} (x: {}, y: {})", chart.chart_type.as_str(), chart.x, y),
        None => format!("{} (x: {})", chart.chart_type.as_str(), chart.x),
    }
}

fn push_text(out: &mut String, text: &str) {
    for segment in split_code_blocks(text) {
        match segment {
            Segment::Prose(p) => {
                out.push_str(&p);
                out.push_str("\n\n");
            }
            Segment::Code { lang, code } => {
                out.push_str(&format!("```{}\n{}\n```\n\n", lang.unwrap_or_default(), code));
            }
        }
    }
}

/// Render an insight for the terminal
pub fn render_insight(insight: &Insight) -> String {
    let mut out = String::new();
    push_text(&mut out, &insight.text);

    if insight.is_error() {
        return out.trim_end().to_string();
    }

    if let Some(next) = insight.next_steps.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str("Next steps:\n");
        push_text(&mut out, next);
    }

    let charts: Vec<_> = [&insight.chart_1, &insight.chart_2]
        .into_iter()
        .flatten()
        .collect();
    if !charts.is_empty() {
        out.push_str("Suggested charts:\n");
        for (i, chart) in charts.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, describe_chart(chart)));
        }
        out.push('\n');
    }

    match &insight.generated_code {
        Some(code) => {
            out.push_str(&format!("Chart code:\n```python\n{}\n```\n", extract_code(code)));
        }
        None => out.push_str("No chart suggested.\n"),
    }

    if insight.truncated {
        out.push_str("\n⚠️ Response hit the output token limit; the answer or code may be incomplete.\n");
    }

    out.trim_end().to_string()
}

fn cap_text(cap: Option<u64>) -> String {
    cap.map(|c| c.to_string())
        .unwrap_or_else(|| "unlimited".to_string())
}

/// `Conversation turns: t/max | Tokens: n/max`
pub fn status_line(session: &Session) -> String {
    let conversation = session.conversation();
    let limits = session.limits();
    format!(
        "Conversation turns: {}/{} | Tokens: {}/{}",
        conversation.turn_count(),
        limits.max_turns,
        conversation.token_count(),
        cap_text(limits.max_tokens)
    )
}

fn limits_phrase(session: &Session) -> String {
    let limits = session.limits();
    match limits.max_tokens {
        Some(tokens) => format!("{} turns or {} tokens", limits.max_turns, tokens),
        None => format!("{} turns", limits.max_turns),
    }
}

/// Warning or hard-stop line for the current limit status
pub fn limit_notice(session: &Session) -> Option<String> {
    match session.limit_status() {
        LimitStatus::Ok => None,
        LimitStatus::NearlyReached => Some(format!(
            "⚠️ Conversation limit nearly reached ({}).",
            limits_phrase(session)
        )),
        LimitStatus::Reached => Some(format!(
            "⚠️ Conversation limit reached ({}). Use /clear to start fresh.",
            limits_phrase(session)
        )),
    }
}
