use crate::error::{Result, TicketGlassError};
use crate::storage::filters::{StoreStats, TicketFilter};
use crate::storage::traits::TicketStore;
use crate::types::{Event, FeedbackRecord, FeedbackStats, FeedbackSubmission, TicketState};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory backend. Holds a preloaded ticket map and an append-only
/// feedback log; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tickets: RwLock<BTreeMap<String, TicketState>>,
    feedback: RwLock<Vec<FeedbackRecord>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the given tickets
    pub fn with_tickets(tickets: impl IntoIterator<Item = TicketState>) -> Result<Self> {
        let store = Self::new();
        for ticket in tickets {
            store.put_ticket(&ticket)?;
        }
        Ok(store)
    }

    /// Store preloaded with the bundled demo tickets
    pub fn with_demo_data() -> Result<Self> {
        let tickets = crate::fixtures::demo_tickets()?;
        log::info!("Memory store loaded with {} demo tickets", tickets.len());
        Self::with_tickets(tickets)
    }

    fn update<F>(&self, ticket_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut TicketState) -> std::result::Result<(), String>,
    {
        let mut tickets = self.tickets.write().map_err(|_| TicketGlassError::LockPoisoned)?;
        let ticket = tickets
            .get_mut(ticket_id)
            .ok_or_else(|| TicketGlassError::NotFound(ticket_id.to_string()))?;
        f(ticket).map_err(|reason| TicketGlassError::InvalidEvent {
            ticket_id: ticket_id.to_string(),
            reason,
        })
    }
}

impl TicketStore for MemoryStore {
    fn fetch_ticket_state(&self, ticket_id: &str) -> Result<TicketState> {
        let tickets = self.tickets.read().map_err(|_| TicketGlassError::LockPoisoned)?;
        match tickets.get(ticket_id) {
            Some(ticket) => {
                log::debug!("Fetched ticket {} from memory store", ticket_id);
                Ok(ticket.clone())
            }
            None => {
                log::warn!("Ticket {} not found in memory store", ticket_id);
                Err(TicketGlassError::NotFound(ticket_id.to_string()))
            }
        }
    }

    fn put_ticket(&self, ticket: &TicketState) -> Result<()> {
        ticket.validate().map_err(|reason| TicketGlassError::InvalidEvent {
            ticket_id: ticket.ticket_id.clone(),
            reason,
        })?;
        let mut tickets = self.tickets.write().map_err(|_| TicketGlassError::LockPoisoned)?;
        if let Some(stored) = tickets.get(&ticket.ticket_id) {
            ticket
                .extends_history(stored)
                .map_err(TicketGlassError::Validation)?;
        }
        tickets.insert(ticket.ticket_id.clone(), ticket.clone());
        Ok(())
    }

    fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<TicketState>> {
        let tickets = self.tickets.read().map_err(|_| TicketGlassError::LockPoisoned)?;
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(tickets
            .values()
            .filter(|t| filter.matches(t))
            .take(limit)
            .cloned()
            .collect())
    }

    fn append_event(&self, ticket_id: &str, event: Event) -> Result<()> {
        self.update(ticket_id, |ticket| ticket.append_event(event))?;
        log::info!("Appended event to {}", ticket_id);
        Ok(())
    }

    fn attach_user_feedback(&self, ticket_id: &str, feedback: &str) -> Result<()> {
        self.update(ticket_id, |ticket| ticket.attach_user_feedback(feedback))
    }

    fn store_feedback(
        &self,
        ticket_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackRecord> {
        // Feedback must point at a ticket we know about
        if !self
            .tickets
            .read()
            .map_err(|_| TicketGlassError::LockPoisoned)?
            .contains_key(ticket_id)
        {
            return Err(TicketGlassError::NotFound(ticket_id.to_string()));
        }

        let record = FeedbackRecord::new(ticket_id, submission);
        self.feedback
            .write()
            .map_err(|_| TicketGlassError::LockPoisoned)?
            .push(record.clone());
        log::info!("Stored feedback for {}: {}", ticket_id, record.choice);
        Ok(record)
    }

    fn feedback_for(&self, ticket_id: &str) -> Result<Vec<FeedbackRecord>> {
        let feedback = self.feedback.read().map_err(|_| TicketGlassError::LockPoisoned)?;
        Ok(feedback
            .iter()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    fn feedback_stats(&self) -> Result<FeedbackStats> {
        let feedback = self.feedback.read().map_err(|_| TicketGlassError::LockPoisoned)?;
        Ok(FeedbackStats::from_records(feedback.iter()))
    }

    fn stats(&self) -> Result<StoreStats> {
        let tickets = self.tickets.read().map_err(|_| TicketGlassError::LockPoisoned)?;
        let feedback_count = self
            .feedback
            .read()
            .map_err(|_| TicketGlassError::LockPoisoned)?
            .len() as u64;
        Ok(StoreStats::from_tickets(tickets.values(), feedback_count))
    }
}
