//! Normalization of semi-structured model output

use super::GenerationError;
use crate::session::Idea;
use serde_json::Value;

const FENCE: &str = "```";

/// Strip an optional triple-backtick block, with or without a language tag.
///
/// The body between the first opening fence and the next closing fence is
/// returned trimmed. An unclosed fence keeps everything after it. Text with
/// no fence is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let Some((_, after_open)) = text.split_once(FENCE) else {
        return text.trim();
    };

    let body = match after_open.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => after_open
            .strip_prefix("json")
            .or_else(|| after_open.strip_prefix("JSON"))
            .unwrap_or(after_open),
    };

    body.split_once(FENCE)
        .map_or(body, |(inner, _)| inner)
        .trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Parse the ideas reply: a JSON array, optionally fenced.
///
/// Only the array shape is checked; element fields fall back to
/// placeholders in [`Idea::from_value`].
pub fn parse_ideas(text: &str) -> Result<Vec<Idea>, GenerationError> {
    let body = strip_code_fence(text);
    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items.iter().map(Idea::from_value).collect()),
        other => Err(GenerationError::Parse(format!(
            "expected a JSON array, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
