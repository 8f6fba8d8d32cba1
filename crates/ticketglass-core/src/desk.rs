use crate::agent::{Agent, AgentOutput, PreparedRequest};
use crate::error::Result;
use crate::reasoning::ReasoningClient;
use crate::storage::{StoreStats, TicketFilter, TicketStore};
use crate::types::{ContextEntry, Event, FeedbackRecord, FeedbackStats, FeedbackSubmission, TicketState};
use std::sync::Arc;

/// High-level TicketGlass API: one store, one agent.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use ticketglass_core::{Agent, HttpReasoningClient, MemoryStore, ReasoningConfig, SupportDesk};
///
/// # async fn run() -> ticketglass_core::Result<()> {
/// let store = Arc::new(MemoryStore::with_demo_data()?);
/// let agent = Agent::new(HttpReasoningClient::new(ReasoningConfig::default()));
/// let desk = SupportDesk::new(store, agent);
/// let update = desk.explain("TKT-001", false).await?;
/// println!("{}", update.summary);
/// # Ok(())
/// # }
/// ```
pub struct SupportDesk<S: TicketStore + ?Sized, C: ReasoningClient> {
    store: Arc<S>,
    agent: Agent<C>,
}

impl<S: TicketStore + ?Sized, C: ReasoningClient> SupportDesk<S, C> {
    pub fn new(store: Arc<S>, agent: Agent<C>) -> Self {
        Self { store, agent }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn agent(&self) -> &Agent<C> {
        &self.agent
    }

    pub fn fetch(&self, ticket_id: &str) -> Result<TicketState> {
        self.store.fetch_ticket_state(ticket_id)
    }

    pub fn list(&self, filter: TicketFilter) -> Result<Vec<TicketState>> {
        self.store.list_tickets(filter)
    }

    /// What we said and what the user said back, oldest first.
    pub fn context_history(&self, ticket_id: &str) -> Result<Vec<ContextEntry>> {
        Ok(self.fetch(ticket_id)?.context_history())
    }

    /// The request that `explain` would send, without sending it.
    pub fn preview(&self, ticket_id: &str) -> Result<PreparedRequest> {
        let ticket = self.fetch(ticket_id)?;
        self.agent.prepare(&ticket)
    }

    /// Generate the next update. With `apply`, the update is appended to the
    /// ticket as a new event in `next_phase`.
    pub async fn explain(&self, ticket_id: &str, apply: bool) -> Result<AgentOutput> {
        let ticket = self.fetch(ticket_id)?;
        let output = self.agent.process_ticket(&ticket).await?;

        if apply {
            let mut event = Event::new(output.next_phase, format!("Update sent ({} tone)", output.tone_applied))
                .with_summary(output.summary.clone());
            if let Some(tip) = &output.learning_tip {
                event = event.with_learning_tip(tip.clone());
            }
            self.store.append_event(ticket_id, event)?;
            log::info!("Applied update to {} (now {})", ticket_id, output.next_phase);
        }
        Ok(output)
    }

    /// Record the user's verdict. A note also answers the latest explanation
    /// when that explanation has no reply yet.
    ///
    /// Once the record is stored the call succeeds. Failing to attach the
    /// note to the ticket is logged and leaves the ticket unchanged.
    pub fn submit_feedback(
        &self,
        ticket_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackRecord> {
        let record = self.store.store_feedback(ticket_id, submission)?;

        if let Some(note) = &record.note {
            if let Err(e) = self.attach_note(ticket_id, note) {
                log::warn!("Feedback stored for {} but note not attached: {}", ticket_id, e);
            }
        }
        Ok(record)
    }

    fn attach_note(&self, ticket_id: &str, note: &str) -> Result<()> {
        let ticket = self.fetch(ticket_id)?;
        if ticket.latest_event().is_some_and(|e| e.awaits_feedback()) {
            self.store.attach_user_feedback(ticket_id, note)?;
        }
        Ok(())
    }

    pub fn feedback_stats(&self) -> Result<FeedbackStats> {
        self.store.feedback_stats()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }
}
