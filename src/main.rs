//! netapp-deleter - Azure NetApp Files bulk teardown
//!
//! Deletes every NetApp account in a subscription along with its capacity
//! pools, volumes, backup vaults and backups.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netapp_deleter::cli::{log_filter, Cli};
use netapp_deleter::config::{self, Config};
use netapp_deleter::Result;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Logging depends on the merged config, so it starts after loading
    let config = match prepare_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(log_filter(config.debug));

    if let Err(e) = run(cli, config).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn prepare_config(cli: &Cli) -> Result<Config> {
    let mut config = config::load_config().await?;
    cli.apply_overrides(&mut config)?;
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    info!(
        "Starting netapp-deleter {} ({} branch, built {})",
        env!("VERSION_WITH_GIT"),
        env!("GIT_BRANCH"),
        env!("BUILD_TIME")
    );

    cli.execute(config).await
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
