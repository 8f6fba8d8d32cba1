use crate::error::{Result, TicketGlassError};
use crate::storage::filters::{StoreStats, TicketFilter};
use crate::types::{Event, FeedbackRecord, FeedbackStats, FeedbackSubmission, TicketState};

/// Data-access contract every ticket backend satisfies
pub trait TicketStore: Send + Sync {
    // === Tickets ===

    /// Fetch a ticket by id. Unknown ids fail with `NotFound`.
    fn fetch_ticket_state(&self, ticket_id: &str) -> Result<TicketState>;

    /// Insert a whole ticket (seeding, imports). An existing ticket is only
    /// replaced when its recorded events are a prefix of the new ones;
    /// anything else fails with `Validation`.
    fn put_ticket(&self, ticket: &TicketState) -> Result<()>;

    /// List tickets matching the filter, ordered by ticket id
    fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<TicketState>>;

    /// Append an event to a ticket's lifecycle
    fn append_event(&self, ticket_id: &str, event: Event) -> Result<()>;

    /// Record the user's reply on the latest event's summary
    fn attach_user_feedback(&self, ticket_id: &str, feedback: &str) -> Result<()>;

    // === Feedback ===

    /// Append a feedback record. Not idempotent: identical calls create
    /// identical-looking records with distinct ids.
    fn store_feedback(
        &self,
        ticket_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackRecord>;

    /// Feedback recorded for one ticket, oldest first
    fn feedback_for(&self, ticket_id: &str) -> Result<Vec<FeedbackRecord>>;

    /// Aggregate counts over every stored feedback record
    fn feedback_stats(&self) -> Result<FeedbackStats>;

    // === Maintenance ===

    fn stats(&self) -> Result<StoreStats>;

    /// Load tickets that are not present yet. Returns how many were added.
    fn seed(&self, tickets: &[TicketState]) -> Result<usize> {
        let mut added = 0;
        for ticket in tickets {
            match self.fetch_ticket_state(&ticket.ticket_id) {
                Ok(_) => continue,
                Err(TicketGlassError::NotFound(_)) => {
                    self.put_ticket(ticket)?;
                    added += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }
}
