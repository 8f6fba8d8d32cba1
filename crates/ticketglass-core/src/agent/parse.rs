use crate::error::{Result, TicketGlassError};
use crate::types::Phase;
use serde::Deserialize;
use std::collections::HashSet;

// Upper bounds on reply fields, in characters
pub const SUMMARY_MAX_CHARS: usize = 500;
pub const REASONING_MAX_CHARS: usize = 300;
pub const NEXT_STEP_MAX_CHARS: usize = 300;
pub const LEARNING_TIP_MAX_CHARS: usize = 250;

/// JSON object the model is asked to reply with.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelReply {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub next_step: String,
    #[serde(default)]
    pub next_phase: Option<String>,
    #[serde(default)]
    pub user_learning_tip: Option<String>,
}

impl ModelReply {
    /// Requested phase, `None` when the model left it out or blank.
    pub fn requested_phase(&self) -> Result<Option<Phase>> {
        match self.next_phase.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Phase>()
                .map(Some)
                .map_err(TicketGlassError::MalformedResponse),
        }
    }
}

/// Remove a surrounding markdown fence (```json ... ```), if any.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn check_field(name: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.is_empty() {
        return Err(TicketGlassError::MalformedResponse(format!(
            "reply has an empty {}",
            name
        )));
    }
    let len = value.chars().count();
    if len > max_chars {
        return Err(TicketGlassError::MalformedResponse(format!(
            "reply {} is {} characters, limit is {}",
            name, len, max_chars
        )));
    }
    Ok(())
}

/// Parse the model's text into a reply. Non-JSON text, an empty summary,
/// reasoning or next step, or any field over its length limit is
/// `MalformedResponse`.
pub fn parse_reply(text: &str) -> Result<ModelReply> {
    let body = strip_fences(text);
    let mut reply: ModelReply = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        log::error!("Unparseable model reply: {}", preview);
        TicketGlassError::MalformedResponse(format!("reply is not a JSON object: {}", e))
    })?;

    reply.summary = reply.summary.trim().to_string();
    reply.reasoning = reply.reasoning.trim().to_string();
    reply.next_step = reply.next_step.trim().to_string();
    reply.user_learning_tip = reply
        .user_learning_tip
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    check_field("summary", &reply.summary, SUMMARY_MAX_CHARS)?;
    check_field("reasoning", &reply.reasoning, REASONING_MAX_CHARS)?;
    check_field("next_step", &reply.next_step, NEXT_STEP_MAX_CHARS)?;
    if let Some(tip) = &reply.user_learning_tip {
        check_field("user_learning_tip", tip, LEARNING_TIP_MAX_CHARS)?;
    }
    Ok(reply)
}

/// Share of distinct lowercase words two texts have in common, relative to
/// the larger word set. 0.0 when either text is empty.
pub fn keyword_overlap_ratio(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let words_b: HashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let overlap = words_a.intersection(&words_b).count();
    overlap as f64 / words_a.len().max(words_b.len()) as f64
}
