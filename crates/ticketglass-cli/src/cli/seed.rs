use crate::config::{Backend, TicketGlassConfig};
use anyhow::Result;
use ticketglass_core::{demo_tickets, RedbStore, TicketStore};

pub fn run(config: &TicketGlassConfig) -> Result<()> {
    if config.storage.backend == Backend::Memory {
        println!("The memory backend always starts from the demo tickets; nothing to seed.");
        return Ok(());
    }

    let path = config.db_path();
    let store = RedbStore::open(&path)?;
    let tickets = demo_tickets()?;
    let added = store.seed(&tickets)?;
    println!(
        "Seeded {} of {} demo tickets into {} ({} already present)",
        added,
        tickets.len(),
        path.display(),
        tickets.len() - added
    );
    Ok(())
}
