//! The explanation agent: ticket history in, next user-facing update out.
//!
//! The agent reads a [`TicketState`], replays its events as a conversation,
//! calls the [`ReasoningClient`] once and parses the reply. It never writes
//! to a store; persisting the result is the caller's decision.

pub mod conversation;
pub mod parse;
pub mod prompts;
pub mod sentiment;

pub use conversation::{build_conversation, replay_events};
pub use parse::{keyword_overlap_ratio, parse_reply, ModelReply};
pub use sentiment::{select_tone, SentimentKeywords, Tone};

use crate::error::Result;
use crate::reasoning::{ReasoningClient, Turn};
use crate::types::{Phase, TicketId, TicketState, UserTone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default word-overlap ratio above which a new summary counts as a repeat
pub const DEFAULT_REPETITION_THRESHOLD: f64 = 0.6;

/// Agent tuning.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Advisory only: exceeding it flags the output, nothing is retried.
    pub repetition_threshold: f64,
    pub keywords: SentimentKeywords,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: prompts::SYSTEM_PROMPT.to_string(),
            repetition_threshold: DEFAULT_REPETITION_THRESHOLD,
            keywords: SentimentKeywords::default(),
        }
    }
}

/// Everything sent to the model for one ticket, before the call is made.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedRequest {
    pub system: String,
    pub turns: Vec<Turn>,
    pub tone: Tone,
    pub sentiment: UserTone,
}

/// Result of processing one ticket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOutput {
    pub ticket_id: TicketId,
    /// Phase the ticket was in when processed.
    pub phase: Phase,
    /// User-facing explanation.
    pub summary: String,
    /// Internal note on why this approach was chosen.
    pub reasoning_note: String,
    pub next_step: String,
    pub next_phase: Phase,
    pub tone_applied: Tone,
    pub sentiment_detected: UserTone,
    /// Only present when `next_phase` is `Resolved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_tip: Option<String>,
    pub repeats_prior_summary: bool,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
}

pub struct Agent<C: ReasoningClient> {
    client: C,
    config: AgentConfig,
}

impl<C: ReasoningClient> Agent<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, AgentConfig::default())
    }

    pub fn with_config(client: C, config: AgentConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Build the system instruction and conversation without calling the model.
    pub fn prepare(&self, ticket: &TicketState) -> Result<PreparedRequest> {
        let sentiment = self
            .config
            .keywords
            .detect(ticket.latest_feedback(), ticket.user_tone);
        let tone = select_tone(ticket.current_phase(), sentiment);
        let turns = build_conversation(ticket, tone)?;
        Ok(PreparedRequest {
            system: self.config.system_prompt.clone(),
            turns,
            tone,
            sentiment,
        })
    }

    /// Generate the next update for a ticket.
    ///
    /// Errors from the reasoning client propagate unchanged. A reply that
    /// `parse_reply` rejects, or one naming an unknown phase, is
    /// `MalformedResponse`.
    pub async fn process_ticket(&self, ticket: &TicketState) -> Result<AgentOutput> {
        let request = self.prepare(ticket)?;
        let phase = ticket.current_phase();
        log::info!(
            "Processing {} (phase={}, tone={}, sentiment={}, turns={})",
            ticket.ticket_id,
            phase,
            request.tone,
            request.sentiment,
            request.turns.len()
        );

        let text = self.client.invoke(&request.system, &request.turns).await?;
        let reply = parse_reply(&text)?;

        // Phases only move forward
        let next_phase = match reply.requested_phase()? {
            Some(requested) if requested < phase => {
                log::warn!(
                    "Ignoring backward move for {}: {} -> {}, staying in {}",
                    ticket.ticket_id,
                    phase,
                    requested,
                    phase
                );
                phase
            }
            Some(requested) => requested,
            None => phase.successor(),
        };

        let learning_tip = match reply.user_learning_tip {
            Some(tip) if next_phase == Phase::Resolved => Some(tip),
            Some(_) => {
                log::warn!(
                    "Dropping learning tip for {}: next phase is {}",
                    ticket.ticket_id,
                    next_phase
                );
                None
            }
            None => None,
        };

        let repeats_prior_summary =
            self.repeats_prior_summary(&ticket.ticket_id, &reply.summary, &ticket.prior_summaries());

        Ok(AgentOutput {
            ticket_id: ticket.ticket_id.clone(),
            phase,
            summary: reply.summary,
            reasoning_note: reply.reasoning,
            next_step: reply.next_step,
            next_phase,
            tone_applied: request.tone,
            sentiment_detected: request.sentiment,
            learning_tip,
            repeats_prior_summary,
            model_used: self.client.model_name().to_string(),
            generated_at: Utc::now(),
        })
    }

    fn repeats_prior_summary(&self, ticket_id: &str, summary: &str, prior: &[&str]) -> bool {
        let worst = prior
            .iter()
            .map(|p| keyword_overlap_ratio(p, summary))
            .fold(0.0_f64, f64::max);
        if worst > self.config.repetition_threshold {
            log::warn!(
                "New summary for {} overlaps a prior one ({:.2} > {:.2})",
                ticket_id,
                worst,
                self.config.repetition_threshold
            );
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TicketGlassError;
    use crate::reasoning::Role;
    use crate::types::Event;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and records every call.
    struct RecordingClient {
        reply: String,
        calls: Mutex<Vec<(String, Vec<Turn>)>>,
    }

    impl RecordingClient {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReasoningClient for RecordingClient {
        async fn invoke(&self, system: &str, conversation: &[Turn]) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), conversation.to_vec()));
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    struct FailingClient;

    #[async_trait]
    impl ReasoningClient for FailingClient {
        async fn invoke(&self, _system: &str, _conversation: &[Turn]) -> Result<String> {
            Err(TicketGlassError::RemoteInvocation("connection reset".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn tkt_001() -> TicketState {
        TicketState::new("TKT-001", "Software", "Excel crashes", "Amir", UserTone::Neutral)
            .with_event(Event::at("09:15", Phase::Received, "Ticket submitted"))
            .with_event(
                Event::at("10:00", Phase::Diagnosed, "Initial diagnosis")
                    .with_summary("cache fix")
                    .with_user_feedback("still broken"),
            )
    }

    const ESCALATE: &str = r#"{"summary":"Since clearing the cache didn't help, we're checking add-ins next.","reasoning":"cache fix failed","next_step":"Open File > Options > Add-ins","next_phase":"Escalated","user_learning_tip":"ignored"}"#;

    #[tokio::test]
    async fn test_tkt_001_conversation_shape() {
        let agent = Agent::new(RecordingClient::new(ESCALATE));
        let output = agent.process_ticket(&tkt_001()).await.unwrap();

        let calls = agent.client().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (system, turns) = &calls[0];
        assert_eq!(system, prompts::SYSTEM_PROMPT);

        let last = turns.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.text, "still broken");

        let assistant: Vec<&Turn> = turns.iter().filter(|t| t.role == Role::Assistant).collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].text, "cache fix");

        assert_eq!(output.next_phase, Phase::Escalated);
        assert_eq!(output.phase, Phase::Diagnosed);
        assert_eq!(output.reasoning_note, "cache fix failed");
        assert_eq!(output.model_used, "recording");
        assert!(output.learning_tip.is_none());
        assert!(!output.repeats_prior_summary);
    }

    #[tokio::test]
    async fn test_sees_both_prior_exchanges_in_order() {
        let ticket = tkt_001().with_event(
            Event::at("10:45", Phase::Escalated, "Escalated")
                .with_summary("check add-ins")
                .with_user_feedback("which ones?"),
        );
        let agent = Agent::new(RecordingClient::new(ESCALATE));
        agent.process_ticket(&ticket).await.unwrap();

        let calls = agent.client().calls.lock().unwrap();
        let texts: Vec<&str> = calls[0].1[1..].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["cache fix", "still broken", "check add-ins", "which ones?"]);
    }

    #[tokio::test]
    async fn test_sentiment_and_tone() {
        let agent = Agent::new(RecordingClient::new(ESCALATE));
        let output = agent.process_ticket(&tkt_001()).await.unwrap();
        // "still broken" reads as frustrated
        assert_eq!(output.sentiment_detected, UserTone::Frustrated);
        assert_eq!(output.tone_applied, Tone::Empathetic);
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let agent = Agent::new(FailingClient);
        let err = agent.process_ticket(&tkt_001()).await.unwrap_err();
        assert!(matches!(err, TicketGlassError::RemoteInvocation(_)));
        assert!(err.is_request_fatal());
    }

    #[tokio::test]
    async fn test_missing_phase_defaults_to_successor() {
        let agent = Agent::new(RecordingClient::new(
            r#"{"summary":"We're on it","reasoning":"r","next_step":"wait"}"#,
        ));
        let output = agent.process_ticket(&tkt_001()).await.unwrap();
        assert_eq!(output.next_phase, Phase::Escalated);
    }

    #[tokio::test]
    async fn test_learning_tip_kept_on_resolve() {
        let agent = Agent::new(RecordingClient::new(
            "```json\n{\"summary\":\"All fixed!\",\"reasoning\":\"r\",\"next_step\":\"none\",\"next_phase\":\"Resolved\",\"user_learning_tip\":\"Disable add-ins first\"}\n```",
        ));
        let output = agent.process_ticket(&tkt_001()).await.unwrap();
        assert_eq!(output.next_phase, Phase::Resolved);
        assert_eq!(output.learning_tip.as_deref(), Some("Disable add-ins first"));
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        let agent = Agent::new(RecordingClient::new("Sorry, I can't help with that."));
        let err = agent.process_ticket(&tkt_001()).await.unwrap_err();
        assert!(matches!(err, TicketGlassError::MalformedResponse(_)));

        let agent = Agent::new(RecordingClient::new(
            r#"{"summary":"ok","reasoning":"r","next_step":"n","next_phase":"Closed"}"#,
        ));
        let err = agent.process_ticket(&tkt_001()).await.unwrap_err();
        assert!(matches!(err, TicketGlassError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_backward_phase_keeps_current() {
        let resolved = tkt_001().with_event(
            Event::at("11:00", Phase::Resolved, "Resolved").with_summary("Excel opens again"),
        );
        let agent = Agent::new(RecordingClient::new(
            r#"{"summary":"Glad it's sorted","reasoning":"r","next_step":"none","next_phase":"Received"}"#,
        ));
        let output = agent.process_ticket(&resolved).await.unwrap();
        assert_eq!(output.phase, Phase::Resolved);
        assert_eq!(output.next_phase, Phase::Resolved);

        // Staying put is allowed
        let agent = Agent::new(RecordingClient::new(
            r#"{"summary":"Still checking","reasoning":"r","next_step":"wait","next_phase":"Diagnosed"}"#,
        ));
        let output = agent.process_ticket(&tkt_001()).await.unwrap();
        assert_eq!(output.next_phase, Phase::Diagnosed);
    }

    #[tokio::test]
    async fn test_repetition_is_flagged_not_retried() {
        let agent = Agent::new(RecordingClient::new(
            r#"{"summary":"cache fix","reasoning":"r","next_step":"n"}"#,
        ));
        let output = agent.process_ticket(&tkt_001()).await.unwrap();
        assert!(output.repeats_prior_summary);
        assert_eq!(output.summary, "cache fix");
        assert_eq!(agent.client().calls.lock().unwrap().len(), 1);
    }
}
