pub mod config_cmd;
pub mod conversation;
pub mod feedback;
pub mod process;
pub mod seed;
pub mod stats;
pub mod ticket;

use crate::config::{Backend, TicketGlassConfig};
use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ticketglass_core::{
    demo_tickets, Agent, HttpReasoningClient, MemoryStore, Phase, RedbStore, SupportDesk,
    TicketStore,
};

#[derive(Parser, Debug)]
#[command(name = "ticketglass")]
#[command(version, about = "Plain-language, context-aware updates for IT support tickets")]
pub struct Cli {
    /// Path to ticketglass.toml
    #[arg(
        long,
        global = true,
        env = "TICKETGLASS_CONFIG",
        default_value = "ticketglass.toml"
    )]
    pub config: PathBuf,

    /// Path to data directory (overrides config file)
    #[arg(long, global = true, env = "TICKETGLASS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tickets
    Tickets(TicketsArgs),
    /// Show one ticket with its conversation history
    Show(ShowArgs),
    /// Print the request the agent would send, without sending it
    Conversation(ConversationArgs),
    /// Generate the next update for a ticket
    Process(ProcessArgs),
    /// Record whether an update helped
    Feedback(FeedbackArgs),
    /// Store and feedback statistics
    Stats,
    /// Load the bundled demo tickets into the durable store
    Seed,
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct TicketsArgs {
    /// Only tickets in this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,
    /// Only tickets currently in this phase
    #[arg(long)]
    pub phase: Option<Phase>,
    #[arg(long)]
    pub limit: Option<usize>,
    /// Output format: table (default) | json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket id, e.g. TKT-001
    pub id: String,
    /// Output format: text (default) | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct ConversationArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    pub id: String,
    /// Append the generated update to the ticket
    #[arg(long)]
    pub apply: bool,
    /// Output format: text (default) | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("verdict").required(true).args(["helpful", "not_helpful"])))]
pub struct FeedbackArgs {
    pub id: String,
    #[arg(long)]
    pub helpful: bool,
    #[arg(long)]
    pub not_helpful: bool,
    /// What the user said; answers the latest update if it has no reply yet
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

pub type Desk = SupportDesk<dyn TicketStore, HttpReasoningClient>;

/// Load the config file and apply command-line overrides.
pub fn load_config(path: &Path, data_dir: Option<&Path>) -> Result<TicketGlassConfig> {
    let mut config = TicketGlassConfig::load_or_default(path)?;
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir.to_path_buf();
    }
    Ok(config)
}

/// Open the configured backend.
pub fn open_store(config: &TicketGlassConfig) -> Result<Arc<dyn TicketStore>> {
    match config.storage.backend {
        Backend::Memory => Ok(Arc::new(MemoryStore::with_demo_data()?)),
        Backend::Redb => {
            let path = config.db_path();
            let store = RedbStore::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            if config.storage.seed_demo_data && store.stats()?.ticket_count == 0 {
                let added = store.seed(&demo_tickets()?)?;
                tracing::info!("Seeded {} demo tickets into {}", added, path.display());
            }
            Ok(Arc::new(store))
        }
    }
}

pub fn build_desk(config: &TicketGlassConfig) -> Result<Desk> {
    let store = open_store(config)?;
    let client = HttpReasoningClient::new(config.reasoning_config());
    let agent = Agent::with_config(client, config.agent_config()?);
    Ok(SupportDesk::new(store, agent))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max - 1).collect::<String>())
    }
}
