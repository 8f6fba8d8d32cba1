pub mod types;
pub mod storage;
pub mod error;
pub mod reasoning;
pub mod agent;
pub mod desk;
pub mod fixtures;

pub use error::{TicketGlassError, Result};
pub use types::*;
pub use storage::{TicketStore, TicketFilter, StoreStats, MemoryStore, RedbStore, CURRENT_SCHEMA_VERSION};
pub use reasoning::{HttpReasoningClient, ReasoningClient, ReasoningConfig, Role, Turn};
pub use agent::{
    Agent, AgentConfig, AgentOutput, PreparedRequest, SentimentKeywords, Tone,
    DEFAULT_REPETITION_THRESHOLD,
};
pub use desk::SupportDesk;
pub use fixtures::{demo_tickets, DEMO_TICKET_ID};
