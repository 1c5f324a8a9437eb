//! native-updater CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::bail;
use native_updater::{CheckStatus, HostVersion, LogNotifier, Notifier, Updater};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("native-updater v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.to_config()?;
    let host = HostVersion::parse(&cli.host_version);
    let notifier = LogNotifier::new(config.notification_title());

    let updater = match Updater::from_config(&config, host, notifier.clone()) {
        Ok(updater) => updater,
        Err(e) => {
            notifier.notify(&e.user_message(&config.host_name));
            return Err(e.into());
        }
    };

    match updater.spawn_check().await? {
        CheckStatus::Completed(outcome) => info!("Check finished: {:?}", outcome),
        CheckStatus::Failed {
            message,
            manual_intervention,
        } => {
            if manual_intervention {
                bail!("manual intervention required: {message}");
            }
            bail!("{message}");
        }
        CheckStatus::AlreadyRunning => info!("Another check is already running"),
    }

    Ok(())
}
