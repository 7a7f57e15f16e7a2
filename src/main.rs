//! venuepulse CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use venuepulse::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; diagnostics go to stderr, signals to stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venuepulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Busyness {
            venues,
            venue_id,
            no_cache,
        } => cli::run_busyness(venues, venue_id, no_cache).await,
        Commands::QueueMentions {
            venues,
            venue_id,
            source,
            window_hours,
        } => cli::run_queue_mentions(venues, venue_id, source, window_hours).await,
        Commands::Batch {
            venues,
            concurrency,
        } => cli::run_batch(venues, concurrency).await,
        Commands::Check { venues } => cli::run_check(venues).await,
    }
}
