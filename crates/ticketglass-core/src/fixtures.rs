//! Bundled demo tickets.
//!
//! Compiled into the binary so the in-memory store works without any files
//! on disk, and so a fresh durable store can be seeded.

use crate::error::{Result, TicketGlassError};
use crate::types::TicketState;

const DEMO_TICKETS_JSON: &str = include_str!("../data/demo_tickets.json");

/// Ticket shown to first-time visitors
pub const DEMO_TICKET_ID: &str = "TKT-001";

/// Parse and validate the bundled demo tickets.
pub fn demo_tickets() -> Result<Vec<TicketState>> {
    parse_tickets(DEMO_TICKETS_JSON)
}

/// Parse a JSON array of tickets. A ticket with an invalid event fails the
/// whole batch with `InvalidEvent`.
pub fn parse_tickets(json: &str) -> Result<Vec<TicketState>> {
    let tickets: Vec<TicketState> = serde_json::from_str(json)?;
    for ticket in &tickets {
        ticket
            .validate()
            .map_err(|reason| TicketGlassError::InvalidEvent {
                ticket_id: ticket.ticket_id.clone(),
                reason,
            })?;
    }
    Ok(tickets)
}
