//! ems - terminal front end for the employee-management backend

mod cli;
mod commands;
mod output;

use clap::Parser;
use ems_client::{ClientConfig, EmsContext};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logger(cli.log.as_deref());

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(timeout) = cli.timeout {
        config = config.with_timeout(timeout);
    }
    tracing::debug!(base_url = %config.base_url, data_dir = %config.data_dir.display(), "Starting ems");

    let ctx = EmsContext::open(config)?;
    commands::run(&ctx, cli.command).await
}

/// Logs go to stderr so command output stays pipeable
fn init_logger(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => tracing_subscriber::EnvFilter::new(filter),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ems=info,ems_client=info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
