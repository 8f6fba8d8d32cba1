use crate::types::Phase;
use std::collections::BTreeMap;

/// Filter criteria for listing tickets
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub category: Option<String>,
    /// Match on the phase of the latest event
    pub phase: Option<Phase>,
    pub limit: Option<usize>,
}

impl TicketFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by category (case-insensitive)
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filter by current phase
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Limit number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn matches(&self, ticket: &crate::types::TicketState) -> bool {
        if let Some(ref category) = self.category {
            if !ticket.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(phase) = self.phase {
            if ticket.current_phase() != phase {
                return false;
            }
        }
        true
    }
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub ticket_count: u64,
    pub event_count: u64,
    pub feedback_count: u64,
    pub tickets_by_phase: BTreeMap<Phase, u64>,
    /// Zero for the in-memory backend
    pub db_size_bytes: u64,
}

impl StoreStats {
    pub(crate) fn from_tickets<'a>(
        tickets: impl IntoIterator<Item = &'a crate::types::TicketState>,
        feedback_count: u64,
    ) -> Self {
        let mut stats = StoreStats {
            feedback_count,
            ..Default::default()
        };
        for ticket in tickets {
            stats.ticket_count += 1;
            stats.event_count += ticket.status_events.len() as u64;
            *stats.tickets_by_phase.entry(ticket.current_phase()).or_insert(0) += 1;
        }
        stats
    }
}
