use thiserror::Error;

pub type Result<T> = std::result::Result<T, TicketGlassError>;

#[derive(Debug, Error)]
pub enum TicketGlassError {
    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Reasoning endpoint failed: {0}")]
    RemoteInvocation(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid event on {ticket_id}: {reason}")]
    InvalidEvent { ticket_id: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl TicketGlassError {
    /// True for the three kinds that end the current request without any
    /// local recovery.
    pub fn is_request_fatal(&self) -> bool {
        matches!(
            self,
            TicketGlassError::NotFound(_)
                | TicketGlassError::RemoteInvocation(_)
                | TicketGlassError::MalformedResponse(_)
        )
    }
}
