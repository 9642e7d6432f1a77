use anyhow::Result;
use clap::Parser;

use udplog_core::config::UdplogConfig;
use udplog_daemon::cli::DaemonCli;
use udplog_daemon::{Orchestrator, logging, orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = UdplogConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;

    // CLI overrides win over file and environment
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }

    if cli.validate {
        let schemas = orchestrator::validate_config(&config).await?;
        println!(
            "configuration {} is valid ({} schema(s) compiled)",
            cli.config.display(),
            schemas
        );
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "udplog-daemon starting"
    );

    let orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("udplog-daemon shut down");
    Ok(())
}
