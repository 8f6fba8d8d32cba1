use crate::error::{Result, TicketGlassError};
use crate::storage::filters::{StoreStats, TicketFilter};
use crate::storage::traits::TicketStore;
use crate::types::{Event, FeedbackRecord, FeedbackStats, FeedbackSubmission, TicketState};
use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition,
    WriteTransaction,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Table definitions
const TICKETS: TableDefinition<&str, &[u8]> = TableDefinition::new("tickets");
const FEEDBACK: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("feedback");

// Secondary index: ticket id -> feedback ids
const FEEDBACK_BY_TICKET: MultimapTableDefinition<&str, &[u8; 16]> =
    MultimapTableDefinition::new("feedback_by_ticket");

// Metadata table
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
/// v1 = tickets and feedback stored as JSON
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Durable backend on an embedded redb file.
/// Tickets are keyed by ticket id and stored as JSON.
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TicketGlassError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if is_new {
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(TICKETS)?;
                let _ = write_txn.open_table(FEEDBACK)?;
                let _ = write_txn.open_multimap_table(FEEDBACK_BY_TICKET)?;
                let mut meta = write_txn.open_table(META)?;
                meta.insert(SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_string().as_bytes())?;
            }
            write_txn.commit()?;
            log::info!("Created ticket store at {}", path.display());
        } else {
            Self::check_schema_version(&db)?;
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(TICKETS)?;
                let _ = write_txn.open_table(FEEDBACK)?;
                let _ = write_txn.open_multimap_table(FEEDBACK_BY_TICKET)?;
                let _ = write_txn.open_table(META)?;
            }
            write_txn.commit()?;
            log::info!("Opened ticket store at {}", path.display());
        }

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Check schema version. Returns error if this binary can't read the file.
    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = {
            let table = read_txn.open_table(META).ok();
            table
                .and_then(|t| {
                    t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                        std::str::from_utf8(v.value())
                            .ok()
                            .and_then(|s| s.parse::<u32>().ok())
                    })
                })
                .unwrap_or(CURRENT_SCHEMA_VERSION)
        };

        if version > CURRENT_SCHEMA_VERSION {
            return Err(TicketGlassError::Validation(format!(
                "Database schema v{} is newer than this binary v{}. Upgrade TicketGlass.",
                version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn serialize_ticket(ticket: &TicketState) -> Result<Vec<u8>> {
        serde_json::to_vec(ticket).map_err(TicketGlassError::from)
    }

    fn deserialize_ticket(bytes: &[u8]) -> Result<TicketState> {
        serde_json::from_slice(bytes).map_err(TicketGlassError::from)
    }

    fn serialize_feedback(record: &FeedbackRecord) -> Result<Vec<u8>> {
        serde_json::to_vec(record).map_err(TicketGlassError::from)
    }

    fn deserialize_feedback(bytes: &[u8]) -> Result<FeedbackRecord> {
        serde_json::from_slice(bytes).map_err(TicketGlassError::from)
    }

    fn invalid(ticket_id: &str, reason: String) -> TicketGlassError {
        TicketGlassError::InvalidEvent {
            ticket_id: ticket_id.to_string(),
            reason,
        }
    }

    /// Read a ticket inside a write transaction
    fn load_for_update(txn: &WriteTransaction, ticket_id: &str) -> Result<TicketState> {
        let table = txn.open_table(TICKETS)?;
        let bytes = table
            .get(ticket_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| TicketGlassError::NotFound(ticket_id.to_string()))?;
        Self::deserialize_ticket(&bytes)
    }

    /// Read-modify-write one ticket in a single transaction
    fn modify_ticket<F>(&self, ticket_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut TicketState) -> std::result::Result<(), String>,
    {
        let write_txn = self.db.begin_write()?;
        let mut ticket = Self::load_for_update(&write_txn, ticket_id)?;
        f(&mut ticket).map_err(|reason| Self::invalid(ticket_id, reason))?;

        let bytes = Self::serialize_ticket(&ticket)?;
        {
            let mut table = write_txn.open_table(TICKETS)?;
            table.insert(ticket_id, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn all_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FEEDBACK)?;
        let mut records = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            records.push(Self::deserialize_feedback(value.value())?);
        }
        Ok(records)
    }
}

impl TicketStore for RedbStore {
    fn fetch_ticket_state(&self, ticket_id: &str) -> Result<TicketState> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKETS)?;

        if let Some(bytes) = table.get(ticket_id)? {
            Self::deserialize_ticket(bytes.value())
        } else {
            log::warn!("Ticket {} not found in {}", ticket_id, self.path.display());
            Err(TicketGlassError::NotFound(ticket_id.to_string()))
        }
    }

    fn put_ticket(&self, ticket: &TicketState) -> Result<()> {
        ticket
            .validate()
            .map_err(|reason| Self::invalid(&ticket.ticket_id, reason))?;

        let bytes = Self::serialize_ticket(ticket)?;
        let write_txn = self.db.begin_write()?;
        match Self::load_for_update(&write_txn, &ticket.ticket_id) {
            Ok(stored) => ticket
                .extends_history(&stored)
                .map_err(TicketGlassError::Validation)?,
            Err(TicketGlassError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        {
            let mut table = write_txn.open_table(TICKETS)?;
            table.insert(ticket.ticket_id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<TicketState>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKETS)?;
        let limit = filter.limit.unwrap_or(usize::MAX);

        // Keys iterate in ticket id order
        let mut tickets = Vec::new();
        for item in table.iter()? {
            if tickets.len() >= limit {
                break;
            }
            let (_, value) = item?;
            let ticket = Self::deserialize_ticket(value.value())?;
            if filter.matches(&ticket) {
                tickets.push(ticket);
            }
        }
        Ok(tickets)
    }

    fn append_event(&self, ticket_id: &str, event: Event) -> Result<()> {
        self.modify_ticket(ticket_id, |ticket| ticket.append_event(event))?;
        log::info!("Appended event to {}", ticket_id);
        Ok(())
    }

    fn attach_user_feedback(&self, ticket_id: &str, feedback: &str) -> Result<()> {
        self.modify_ticket(ticket_id, |ticket| ticket.attach_user_feedback(feedback))
    }

    fn store_feedback(
        &self,
        ticket_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::new(ticket_id, submission);
        let id_bytes = *record.id.as_bytes();
        let bytes = Self::serialize_feedback(&record)?;

        let write_txn = self.db.begin_write()?;
        {
            let tickets = write_txn.open_table(TICKETS)?;
            if tickets.get(ticket_id)?.is_none() {
                return Err(TicketGlassError::NotFound(ticket_id.to_string()));
            }
        }
        {
            let mut table = write_txn.open_table(FEEDBACK)?;
            table.insert(&id_bytes, bytes.as_slice())?;
        }
        {
            let mut index = write_txn.open_multimap_table(FEEDBACK_BY_TICKET)?;
            index.insert(ticket_id, &id_bytes)?;
        }
        write_txn.commit()?;

        log::info!("Stored feedback for {}: {}", ticket_id, record.choice);
        Ok(record)
    }

    fn feedback_for(&self, ticket_id: &str) -> Result<Vec<FeedbackRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_multimap_table(FEEDBACK_BY_TICKET)?;
        let table = read_txn.open_table(FEEDBACK)?;

        // UUIDv7 ids: index order is submission order
        let ids: Vec<[u8; 16]> = index
            .get(ticket_id)?
            .map(|result| result.map(|guard| *guard.value()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(bytes) = table.get(&id)? {
                records.push(Self::deserialize_feedback(bytes.value())?);
            }
        }
        Ok(records)
    }

    fn feedback_stats(&self) -> Result<FeedbackStats> {
        let records = self.all_feedback()?;
        Ok(FeedbackStats::from_records(&records))
    }

    fn stats(&self) -> Result<StoreStats> {
        let tickets = self.list_tickets(TicketFilter::new())?;
        let feedback_count = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(FEEDBACK)?;
            table.iter()?.count() as u64
        };

        let mut stats = StoreStats::from_tickets(&tickets, feedback_count);
        stats.db_size_bytes = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(stats)
    }
}
