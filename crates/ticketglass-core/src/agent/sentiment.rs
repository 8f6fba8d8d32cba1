//! Keyword heuristics for reading the user's mood and picking a tone.

use crate::types::{Phase, UserTone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const FRUSTRATED: &[&str] = &[
    "frustrat", "angry", "mad", "upset", "ugh", "argh", "annoyed", "tired", "exasperat",
    "fed up", "enough", "seriously", "ridiculous", "unbelievable", "impossible", "broken",
    "doesn't work", "still not working", "been trying all",
];

const SATISFIED: &[&str] = &[
    "thanks", "thank you", "awesome", "great", "excellent", "perfect", "worked", "fixed",
    "solved", "finally", "yes", "yay", "fantastic", "amazing", "appreciated", "helpful",
    "exactly",
];

const CONFUSED: &[&str] = &[
    "confus", "don't understand", "what", "huh", "mean", "unclear", "lost", "explain",
    "again", "sorry", "not sure", "didn't catch", "slow down",
];

/// Substring keyword sets, one per detectable mood. Matching is
/// case-insensitive and checked in the order frustrated, satisfied, confused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentKeywords {
    pub frustrated: BTreeSet<String>,
    pub satisfied: BTreeSet<String>,
    pub confused: BTreeSet<String>,
}

impl Default for SentimentKeywords {
    fn default() -> Self {
        let set = |words: &[&str]| -> BTreeSet<String> { words.iter().map(|w| w.to_string()).collect() };
        Self {
            frustrated: set(FRUSTRATED),
            satisfied: set(SATISFIED),
            confused: set(CONFUSED),
        }
    }
}

impl SentimentKeywords {
    fn set_mut(&mut self, tone: UserTone) -> Option<&mut BTreeSet<String>> {
        match tone {
            UserTone::Frustrated => Some(&mut self.frustrated),
            UserTone::Satisfied => Some(&mut self.satisfied),
            UserTone::Confused => Some(&mut self.confused),
            UserTone::Neutral => None,
        }
    }

    /// Keywords for a mood. Neutral has none.
    pub fn keywords(&self, tone: UserTone) -> Option<&BTreeSet<String>> {
        match tone {
            UserTone::Frustrated => Some(&self.frustrated),
            UserTone::Satisfied => Some(&self.satisfied),
            UserTone::Confused => Some(&self.confused),
            UserTone::Neutral => None,
        }
    }

    /// Add a keyword. Returns false for neutral, blank keywords and duplicates.
    pub fn add(&mut self, tone: UserTone, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return false;
        }
        self.set_mut(tone).map(|s| s.insert(keyword)).unwrap_or(false)
    }

    /// Remove a keyword. Returns whether it was present.
    pub fn remove(&mut self, tone: UserTone, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        self.set_mut(tone).map(|s| s.remove(&keyword)).unwrap_or(false)
    }

    /// Mood implied by `feedback`, or `fallback` when nothing matches.
    pub fn detect(&self, feedback: Option<&str>, fallback: UserTone) -> UserTone {
        let Some(text) = feedback.filter(|f| !f.trim().is_empty()) else {
            return fallback;
        };
        let lower = text.to_lowercase();
        for tone in [UserTone::Frustrated, UserTone::Satisfied, UserTone::Confused] {
            if let Some(hit) = self
                .keywords(tone)
                .and_then(|set| set.iter().find(|k| lower.contains(k.as_str())))
            {
                log::debug!("Sentiment {} from keyword '{}'", tone, hit);
                return tone;
            }
        }
        log::debug!("No sentiment keyword matched, keeping {}", fallback);
        fallback
    }
}

/// Register used for the next explanation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Initial,
    Empathetic,
    Escalation,
    Celebratory,
    Simplified,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Initial => "initial",
            Tone::Empathetic => "empathetic",
            Tone::Escalation => "escalation",
            Tone::Celebratory => "celebratory",
            Tone::Simplified => "simplified",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a tone from the ticket's phase and the detected mood.
pub fn select_tone(phase: Phase, sentiment: UserTone) -> Tone {
    match (phase, sentiment) {
        (Phase::Resolved, _) => Tone::Celebratory,
        (_, UserTone::Frustrated) => Tone::Empathetic,
        (_, UserTone::Confused) => Tone::Simplified,
        (Phase::Diagnosed | Phase::Escalated, _) => Tone::Escalation,
        _ => Tone::Initial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frustration_wins_over_thanks() {
        let keywords = SentimentKeywords::default();
        let tone = keywords.detect(Some("Thanks, but it's still broken"), UserTone::Neutral);
        assert_eq!(tone, UserTone::Frustrated);
    }

    #[test]
    fn test_satisfied_and_confused() {
        let keywords = SentimentKeywords::default();
        assert_eq!(
            keywords.detect(Some("That worked! Excel is open now."), UserTone::Frustrated),
            UserTone::Satisfied
        );
        assert_eq!(
            keywords.detect(Some("I don't understand the cache part"), UserTone::Neutral),
            UserTone::Confused
        );
    }

    #[test]
    fn test_no_match_keeps_fallback() {
        let keywords = SentimentKeywords::default();
        assert_eq!(keywords.detect(Some("Ok, rebooting now"), UserTone::Frustrated), UserTone::Frustrated);
        assert_eq!(keywords.detect(None, UserTone::Confused), UserTone::Confused);
        assert_eq!(keywords.detect(Some("   "), UserTone::Satisfied), UserTone::Satisfied);
    }

    #[test]
    fn test_add_and_remove_keywords() {
        let mut keywords = SentimentKeywords::default();
        assert!(keywords.add(UserTone::Frustrated, "  Grr "));
        assert!(!keywords.add(UserTone::Frustrated, "grr"));
        assert!(!keywords.add(UserTone::Neutral, "meh"));
        assert_eq!(keywords.detect(Some("GRR"), UserTone::Neutral), UserTone::Frustrated);

        assert!(keywords.remove(UserTone::Frustrated, "grr"));
        assert!(!keywords.remove(UserTone::Frustrated, "grr"));
        assert_eq!(keywords.detect(Some("grr"), UserTone::Neutral), UserTone::Neutral);
    }

    #[test]
    fn test_select_tone() {
        assert_eq!(select_tone(Phase::Resolved, UserTone::Frustrated), Tone::Celebratory);
        assert_eq!(select_tone(Phase::Diagnosed, UserTone::Frustrated), Tone::Empathetic);
        assert_eq!(select_tone(Phase::Assigned, UserTone::Confused), Tone::Simplified);
        assert_eq!(select_tone(Phase::Escalated, UserTone::Neutral), Tone::Escalation);
        assert_eq!(select_tone(Phase::Diagnosed, UserTone::Satisfied), Tone::Escalation);
        assert_eq!(select_tone(Phase::Received, UserTone::Satisfied), Tone::Initial);
    }
}
