use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kindling::app::AppContext;
use kindling::cli::{commands, Cli, Commands};
use kindling::config::Config;
use kindling::domain::FeedKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::with_workers(cli.workers);

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let config = Config::load()?;
            kindling::tui::run(Arc::new(ctx), Arc::new(config)).await?;
        }
        Commands::News => {
            commands::show_listing(&ctx, FeedKind::NewStories).await?;
        }
        Commands::Jobs => {
            commands::show_listing(&ctx, FeedKind::JobStories).await?;
        }
        Commands::Poll => {
            commands::poll_demo(&ctx).await?;
        }
        Commands::Watch => {
            commands::watch(&ctx).await?;
        }
    }

    Ok(())
}
