use crate::agent::prompts::{ticket_brief, NUDGE};
use crate::agent::sentiment::Tone;
use crate::error::{Result, TicketGlassError};
use crate::reasoning::{Role, Turn};
use crate::types::TicketState;

/// Turn the event history into the ordered conversation sent to the model.
///
/// Opening brief first, then every non-blank summary as an assistant turn and
/// every non-blank feedback as a user turn, oldest first. When the history
/// ends on one of our own explanations a closing nudge is added so the
/// conversation always ends with the user.
pub fn build_conversation(ticket: &TicketState, tone: Tone) -> Result<Vec<Turn>> {
    ticket
        .validate()
        .map_err(|reason| TicketGlassError::InvalidEvent {
            ticket_id: ticket.ticket_id.clone(),
            reason,
        })?;

    let mut turns = vec![ticket_brief(ticket, tone)];
    turns.extend(replay_events(ticket));

    if turns.last().map(|t| t.role) == Some(Role::Assistant) {
        turns.push(Turn::user(NUDGE));
    }

    log::debug!(
        "Built conversation for {}: {} turns from {} events",
        ticket.ticket_id,
        turns.len(),
        ticket.status_events.len()
    );
    Ok(turns)
}

/// Summary and feedback turns only, in chronological order.
pub fn replay_events(ticket: &TicketState) -> Vec<Turn> {
    let mut turns = Vec::new();
    for event in &ticket.status_events {
        if let Some(summary) = event.summary_text() {
            turns.push(Turn::assistant(summary));
        }
        if let Some(feedback) = event.feedback_text() {
            turns.push(Turn::user(feedback));
        }
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, Phase, UserTone};
    use proptest::prelude::*;

    fn tkt_001() -> TicketState {
        TicketState::new("TKT-001", "Software", "Excel crashes", "Amir", UserTone::Frustrated)
            .with_event(Event::at("09:15", Phase::Received, "Ticket submitted"))
            .with_event(Event::at("09:45", Phase::Assigned, "Assigned"))
            .with_event(
                Event::at("10:00", Phase::Diagnosed, "Initial diagnosis")
                    .with_summary("cache fix")
                    .with_user_feedback("still broken"),
            )
    }

    #[test]
    fn test_ends_on_latest_feedback() {
        let turns = build_conversation(&tkt_001(), Tone::Empathetic).unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1], Turn::assistant("cache fix"));
        assert_eq!(turns[2], Turn::user("still broken"));
    }

    #[test]
    fn test_nudge_when_awaiting_reply() {
        let ticket = tkt_001().with_event(
            Event::at("10:45", Phase::Escalated, "Escalated").with_summary("check add-ins"),
        );
        let turns = build_conversation(&ticket, Tone::Escalation).unwrap();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[3], Turn::assistant("check add-ins"));
        assert_eq!(turns[4], Turn::user(NUDGE));
    }

    #[test]
    fn test_no_exchanges_is_brief_only() {
        let ticket = TicketState::new("TKT-2", "Network", "VPN", "Sam", UserTone::Neutral)
            .with_event(Event::at("09:00", Phase::Received, "Ticket submitted"));
        let turns = build_conversation(&ticket, Tone::Initial).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let ticket = TicketState::new("TKT-3", "Email", "t", "u", UserTone::Neutral)
            .with_event(Event::at("09:00", Phase::Diagnosed, "Reply").with_summary("  "));
        assert!(replay_events(&ticket).is_empty());
    }

    #[test]
    fn test_feedback_without_summary_is_rejected() {
        let mut ticket = tkt_001();
        ticket
            .status_events
            .push(Event::at("11:00", Phase::Escalated, "Reply").with_user_feedback("hello?"));
        let err = build_conversation(&ticket, Tone::Initial).unwrap_err();
        assert!(matches!(err, TicketGlassError::InvalidEvent { .. }));
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        (
            0usize..5,
            proptest::option::of("[a-z]{1,12}"),
            proptest::option::of("[a-z]{1,12}"),
        )
            .prop_map(|(phase, summary, feedback)| {
                let mut event = Event::at("09:00", Phase::ALL[phase], "event");
                if let Some(s) = summary {
                    event = event.with_summary(s);
                    if let Some(f) = feedback {
                        event = event.with_user_feedback(f);
                    }
                }
                event
            })
    }

    proptest! {
        #[test]
        fn prop_replay_preserves_order(events in proptest::collection::vec(arb_event(), 0..12)) {
            let mut ticket = TicketState::new("TKT-P", "Software", "t", "u", UserTone::Neutral);
            ticket.status_events = events.clone();

            let expected: Vec<Turn> = events
                .iter()
                .flat_map(|e| {
                    e.summary
                        .clone()
                        .map(Turn::assistant)
                        .into_iter()
                        .chain(e.user_feedback.clone().map(Turn::user))
                })
                .collect();

            let turns = build_conversation(&ticket, Tone::Initial).unwrap();
            let replayed: Vec<Turn> = turns[1..]
                .iter()
                .filter(|t| t.text != NUDGE)
                .cloned()
                .collect();
            prop_assert_eq!(replayed, expected);
            prop_assert_eq!(turns.last().map(|t| t.role), Some(Role::User));
        }
    }
}
