// src/main.rs
// copycat - streamed copycat detection server and CLI

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use copycat::cli::{run_detect, run_history, run_serve, Cli, Commands};
use copycat::config::CopycatConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = CopycatConfig::from_env();

    // Server logs at the configured level; client commands stay quiet
    let log_level = match &cli.command {
        Some(Commands::Serve { .. }) | None => loaded.config.tracing_level(),
        Some(Commands::Detect { .. }) | Some(Commands::History { .. }) => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    loaded.report();
    let config = loaded.config;

    match cli.command {
        Some(Commands::Serve { host, port }) => run_serve(config, host, port).await,
        None => run_serve(config, None, None).await,
        Some(Commands::Detect {
            text,
            url,
            date,
            server,
            json,
            quiet,
        }) => run_detect(&server, text, url, date, json, quiet).await,
        Some(Commands::History {
            server,
            visitor_file,
            action,
        }) => run_history(&server, visitor_file, action).await,
    }
}
