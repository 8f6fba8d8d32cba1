use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Type alias for ticket identifiers ("TKT-001")
pub type TicketId = String;

/// Type alias for feedback record identifiers
pub type FeedbackId = Uuid;

/// Lifecycle phases, in the order a ticket moves through them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Submitted, nobody looked at it yet.
    Received,
    /// Routed to a team.
    Assigned,
    /// First explanation given.
    Diagnosed,
    /// Moved to a deeper or different approach.
    Escalated,
    /// Closed out.
    Resolved,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Received,
        Phase::Assigned,
        Phase::Diagnosed,
        Phase::Escalated,
        Phase::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Received => "Received",
            Phase::Assigned => "Assigned",
            Phase::Diagnosed => "Diagnosed",
            Phase::Escalated => "Escalated",
            Phase::Resolved => "Resolved",
        }
    }

    /// The phase that normally follows this one. `Resolved` is terminal.
    pub fn successor(self) -> Phase {
        match self {
            Phase::Received => Phase::Assigned,
            Phase::Assigned => Phase::Diagnosed,
            Phase::Diagnosed => Phase::Escalated,
            Phase::Escalated => Phase::Resolved,
            Phase::Resolved => Phase::Resolved,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Resolved
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown phase '{}'", s))
    }
}

/// How the user comes across. Seeded from the ticket, refined per request
/// from the latest feedback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserTone {
    Frustrated,
    Satisfied,
    #[default]
    Neutral,
    Confused,
}

impl UserTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTone::Frustrated => "frustrated",
            UserTone::Satisfied => "satisfied",
            UserTone::Neutral => "neutral",
            UserTone::Confused => "confused",
        }
    }
}

impl fmt::Display for UserTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserTone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frustrated" => Ok(UserTone::Frustrated),
            "satisfied" => Ok(UserTone::Satisfied),
            "neutral" => Ok(UserTone::Neutral),
            "confused" => Ok(UserTone::Confused),
            other => Err(format!("Unknown tone '{}'", other)),
        }
    }
}

/// One recorded occurrence in a ticket's lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Display time ("09:15").
    pub time: String,

    pub phase: Phase,

    /// Short description of what happened.
    pub event: String,

    /// Agent-authored explanation for this phase. Absent for mechanical
    /// events such as "Ticket submitted".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// The user's reply to `summary`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_tip: Option<String>,
}

impl Event {
    /// Mechanical event stamped with the current UTC time.
    pub fn new(phase: Phase, event: impl Into<String>) -> Self {
        Self::at(Utc::now().format("%H:%M").to_string(), phase, event)
    }

    pub fn at(time: impl Into<String>, phase: Phase, event: impl Into<String>) -> Self {
        Event {
            time: time.into(),
            phase,
            event: event.into(),
            summary: None,
            user_feedback: None,
            resolution: None,
            learning_tip: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_user_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.user_feedback = Some(feedback.into());
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_learning_tip(mut self, tip: impl Into<String>) -> Self {
        self.learning_tip = Some(tip.into());
        self
    }

    /// Summary text, if present and not blank.
    pub fn summary_text(&self) -> Option<&str> {
        non_blank(self.summary.as_deref())
    }

    /// Feedback text, if present and not blank.
    pub fn feedback_text(&self) -> Option<&str> {
        non_blank(self.user_feedback.as_deref())
    }

    /// True when the event carries a summary the user has not answered yet.
    pub fn awaits_feedback(&self) -> bool {
        self.summary_text().is_some() && self.feedback_text().is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.event.trim().is_empty() {
            return Err("Event description is empty".to_string());
        }
        // Feedback always answers a summary
        if self.feedback_text().is_some() && self.summary_text().is_none() {
            return Err(format!(
                "{} event '{}' has user feedback but no summary",
                self.phase, self.event
            ));
        }
        Ok(())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Full ticket state as owned by the data adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketState {
    /// Unique identifier. Immutable once created.
    pub ticket_id: TicketId,

    /// Software, Hardware, Network, Access, Email...
    pub category: String,

    pub title: String,

    pub user_name: String,

    pub user_tone: UserTone,

    /// Chronological, append-only.
    #[serde(default)]
    pub status_events: Vec<Event>,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// One exchange pulled out of the event history, for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextEntry {
    pub phase: Phase,
    pub time: String,
    pub what_we_said: Option<String>,
    pub user_response: Option<String>,
}

impl TicketState {
    pub fn new(
        ticket_id: impl Into<TicketId>,
        category: impl Into<String>,
        title: impl Into<String>,
        user_name: impl Into<String>,
        user_tone: UserTone,
    ) -> Self {
        TicketState {
            ticket_id: ticket_id.into(),
            category: category.into(),
            title: title.into(),
            user_name: user_name.into(),
            user_tone,
            status_events: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Builder-style append used when assembling fixtures.
    pub fn with_event(mut self, event: Event) -> Self {
        self.status_events.push(event);
        self
    }

    /// Phase of the last event; `Received` for a ticket without events.
    pub fn current_phase(&self) -> Phase {
        self.status_events
            .last()
            .map(|e| e.phase)
            .unwrap_or(Phase::Received)
    }

    pub fn latest_event(&self) -> Option<&Event> {
        self.status_events.last()
    }

    /// Most recent non-blank feedback anywhere in the history.
    pub fn latest_feedback(&self) -> Option<&str> {
        self.status_events.iter().rev().find_map(|e| e.feedback_text())
    }

    /// Every non-blank summary, oldest first.
    pub fn prior_summaries(&self) -> Vec<&str> {
        self.status_events
            .iter()
            .filter_map(|e| e.summary_text())
            .collect()
    }

    /// Events that carried an exchange, oldest first.
    pub fn context_history(&self) -> Vec<ContextEntry> {
        self.status_events
            .iter()
            .filter(|e| e.summary_text().is_some() || e.feedback_text().is_some())
            .map(|e| ContextEntry {
                phase: e.phase,
                time: e.time.clone(),
                what_we_said: e.summary_text().map(str::to_string),
                user_response: e.feedback_text().map(str::to_string),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ticket_id.trim().is_empty() {
            return Err("Ticket id is empty".to_string());
        }
        for event in &self.status_events {
            event.validate()?;
        }
        Ok(())
    }

    /// Check that this ticket can overwrite `stored`: the stored events
    /// must be an unchanged prefix of ours.
    pub fn extends_history(&self, stored: &TicketState) -> Result<(), String> {
        if self.status_events.starts_with(&stored.status_events) {
            Ok(())
        } else {
            Err(format!(
                "Replacing {} would rewrite its {} recorded events",
                stored.ticket_id,
                stored.status_events.len()
            ))
        }
    }

    /// Append a new event. Existing events are never touched.
    pub fn append_event(&mut self, event: Event) -> Result<(), String> {
        event.validate()?;
        self.status_events.push(event);
        Ok(())
    }

    /// Close the feedback loop on the latest event.
    pub fn attach_user_feedback(&mut self, feedback: &str) -> Result<(), String> {
        if feedback.trim().is_empty() {
            return Err("Feedback text is empty".to_string());
        }
        let latest = self
            .status_events
            .last_mut()
            .ok_or_else(|| "Ticket has no events to respond to".to_string())?;
        if latest.summary_text().is_none() {
            return Err(format!(
                "Latest {} event has no summary to respond to",
                latest.phase
            ));
        }
        if latest.feedback_text().is_some() {
            return Err(format!(
                "Latest {} event already has user feedback",
                latest.phase
            ));
        }
        latest.user_feedback = Some(feedback.to_string());
        Ok(())
    }
}

/// The user's verdict on an explanation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackChoice {
    Helpful,
    NotHelpful,
}

impl FeedbackChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackChoice::Helpful => "helpful",
            FeedbackChoice::NotHelpful => "not_helpful",
        }
    }
}

impl fmt::Display for FeedbackChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the presentation layer hands in when the user answers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSubmission {
    pub choice: FeedbackChoice,
    pub note: Option<String>,
}

impl FeedbackSubmission {
    pub fn helpful() -> Self {
        FeedbackSubmission {
            choice: FeedbackChoice::Helpful,
            note: None,
        }
    }

    pub fn not_helpful() -> Self {
        FeedbackSubmission {
            choice: FeedbackChoice::NotHelpful,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A stored feedback record. Append-only, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    /// UUIDv7, so ids sort in submission order.
    pub id: FeedbackId,
    pub ticket_id: TicketId,
    pub choice: FeedbackChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(ticket_id: impl Into<TicketId>, submission: FeedbackSubmission) -> Self {
        FeedbackRecord {
            id: Uuid::now_v7(),
            ticket_id: ticket_id.into(),
            choice: submission.choice,
            note: submission.note.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

/// Aggregate feedback counts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedbackStats {
    pub total: u64,
    pub helpful: u64,
    pub not_helpful: u64,
    /// Rounded to one decimal. 0.0 when nothing was recorded.
    pub helpful_percentage: f64,
    pub by_ticket: BTreeMap<TicketId, u64>,
}

impl FeedbackStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FeedbackRecord>) -> Self {
        let mut stats = FeedbackStats::default();
        for record in records {
            stats.record(record);
        }
        stats.finish();
        stats
    }

    fn record(&mut self, record: &FeedbackRecord) {
        self.total += 1;
        match record.choice {
            FeedbackChoice::Helpful => self.helpful += 1,
            FeedbackChoice::NotHelpful => self.not_helpful += 1,
        }
        *self.by_ticket.entry(record.ticket_id.clone()).or_insert(0) += 1;
    }

    fn finish(&mut self) {
        self.helpful_percentage = if self.total == 0 {
            0.0
        } else {
            (self.helpful as f64 / self.total as f64 * 1000.0).round() / 10.0
        };
    }
}
