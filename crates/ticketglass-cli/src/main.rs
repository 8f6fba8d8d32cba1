mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        // Config commands report problems themselves instead of failing below
        Commands::Config(cmd) => {
            return cli::config_cmd::run(cmd, &cli.config, cli.data_dir.as_deref())
        }
        command => command,
    };

    let config = cli::load_config(&cli.config, cli.data_dir.as_deref())?;
    let problems = config.validate();
    if !problems.is_empty() {
        anyhow::bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
    }

    if let Commands::Seed = command {
        return cli::seed::run(&config);
    }

    let desk = cli::build_desk(&config)?;
    match command {
        Commands::Tickets(args) => cli::ticket::list(args, &desk),
        Commands::Show(args) => cli::ticket::show(args, &desk),
        Commands::Conversation(args) => cli::conversation::run(args, &desk),
        Commands::Process(args) => cli::process::run(args, &desk).await,
        Commands::Feedback(args) => cli::feedback::run(args, &desk),
        Commands::Stats => cli::stats::run(&desk),
        Commands::Seed | Commands::Config(_) => Ok(()),
    }
}
