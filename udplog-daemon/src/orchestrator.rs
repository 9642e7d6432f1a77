//! Ingest orchestration -- assembly, signal handling and loop lifecycle.
//!
//! The [`Orchestrator`] loads the schema registry, builds the publisher
//! selected by `[output]`, binds the ingest socket and drives the
//! [`IngestionLoop`] until a shutdown signal arrives.
//!
//! # Shutdown
//!
//! The loop only observes the cancellation token between datagrams.
//! After cancelling, the orchestrator waits for one receive timeout plus
//! [`SHUTDOWN_GRACE_MARGIN`]; if the loop is still blocked in a receive
//! the task is aborted, which drops the socket.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use udplog_core::config::{OutputConfig, UdplogConfig};
use udplog_core::pipeline::Publisher;
use udplog_ingest::{
    IngestConfig, IngestError, IngestStats, IngestionLoop, JsonLinesPublisher, SchemaLoader,
    SchemaRegistry,
};

use crate::metrics_server;

/// Extra time granted to the loop on top of one receive timeout.
pub const SHUTDOWN_GRACE_MARGIN: Duration = Duration::from_millis(500);

/// Boxed publisher chosen at runtime from `[output]`.
pub type DynPublisher = Box<dyn Publisher>;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: UdplogConfig,
    /// Bound ingest loop, moved into a task by [`run`](Self::run).
    ingest: IngestionLoop<DynPublisher>,
    /// Cancellation token shared with the loop.
    shutdown: CancellationToken,
    /// How long to wait for the loop after cancelling.
    grace: Duration,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, a schema
    /// file is unreadable or invalid, the output cannot be opened, or the
    /// ingest socket cannot be bound.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = UdplogConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: UdplogConfig) -> Result<Self> {
        let publisher = build_publisher(&config.output)?;
        Self::build_with_publisher(config, publisher).await
    }

    /// Build with an explicit publisher instead of the one from `[output]`.
    pub async fn build_with_publisher(
        config: UdplogConfig,
        publisher: DynPublisher,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let registry = load_registry(&config).await?;

        let ingest_config = IngestConfig::from_core(&config.ingest);
        let shutdown = CancellationToken::new();
        let ingest = IngestionLoop::bind(
            &ingest_config,
            Arc::new(registry),
            publisher,
            shutdown.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("failed to start ingest: {}", e))?;

        let grace = ingest_config
            .recv_timeout()
            .map_or(SHUTDOWN_GRACE_MARGIN, |timeout| timeout + SHUTDOWN_GRACE_MARGIN);

        tracing::info!(
            addr = %ingest.local_addr(),
            json_validation = ingest_config.enable_json_validation,
            syslog_only = ingest_config.enable_syslog_format_only,
            output = %config.output.kind,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            ingest,
            shutdown,
            grace,
        })
    }

    /// Run until SIGTERM/SIGINT or a fatal socket error.
    pub async fn run(self) -> Result<Option<IngestStats>> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Run until `shutdown` resolves or the loop fails.
    ///
    /// Returns the final stats, or `None` when the loop had to be aborted.
    pub async fn run_until<F>(self, shutdown: F) -> Result<Option<IngestStats>>
    where
        F: Future<Output = Result<&'static str>>,
    {
        let Self {
            mut ingest,
            shutdown: token,
            grace,
            ..
        } = self;

        let task = tokio::spawn(async move {
            ingest.run().await?;
            Ok::<_, IngestError>(ingest.stats().clone())
        });

        supervise(task, shutdown, token, grace).await
    }

    /// Address the ingest socket is bound to.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.ingest.local_addr()
    }

    /// Token that stops the ingest loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &UdplogConfig {
        &self.config
    }
}

/// Handle of the spawned ingest loop task.
type IngestTask = JoinHandle<Result<IngestStats, IngestError>>;

/// Wait for the loop task or the shutdown future, whichever ends first.
///
/// A loop that ends on its own is a fatal socket error and is returned as
/// `Err`. After a signal the token is cancelled and the task gets `grace`
/// to finish before it is aborted.
async fn supervise<F>(
    mut task: IngestTask,
    shutdown: F,
    token: CancellationToken,
    grace: Duration,
) -> Result<Option<IngestStats>>
where
    F: Future<Output = Result<&'static str>>,
{
    let signal = tokio::select! {
        joined = &mut task => {
            // Loop ended without being cancelled: only a fatal socket error does that.
            let stats = finish(joined)?;
            return Ok(Some(stats));
        }
        signal = shutdown => signal,
    };

    token.cancel();
    let signal = match signal {
        Ok(signal) => signal,
        Err(e) => {
            task.abort();
            return Err(e);
        }
    };
    tracing::info!(signal, "shutdown signal received");

    match tokio::time::timeout(grace, &mut task).await {
        Ok(joined) => finish(joined).map(Some),
        Err(_) => {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "ingest loop still blocked in receive, aborting"
            );
            task.abort();
            let _ = task.await;
            Ok(None)
        }
    }
}

fn finish(
    joined: Result<Result<IngestStats, IngestError>, tokio::task::JoinError>,
) -> Result<IngestStats> {
    let stats = joined
        .map_err(|e| anyhow::anyhow!("ingest task failed: {}", e))?
        .map_err(|e| anyhow::anyhow!("ingest loop stopped: {}", e))?;
    log_stats(&stats);
    Ok(stats)
}

/// Validate configuration and compile the schemas the daemon would load.
///
/// Used by `--validate`. Schemas are only compiled when json validation is
/// enabled, same as at startup. Returns the number of compiled schemas.
pub async fn validate_config(config: &UdplogConfig) -> Result<usize> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    IngestConfig::from_core(&config.ingest)
        .validate()
        .map_err(|e| anyhow::anyhow!("ingest config invalid: {}", e))?;

    let registry = load_registry(config).await?;
    Ok(registry.len())
}

/// Build the schema registry. Schemas are only loaded when validation is on.
async fn load_registry(config: &UdplogConfig) -> Result<SchemaRegistry> {
    if !config.ingest.enable_json_validation {
        if !config.ingest.json_document_type_schema.is_empty() {
            tracing::info!("json validation disabled, configured schemas are not loaded");
        }
        return Ok(SchemaRegistry::empty());
    }

    SchemaLoader::load(&config.ingest.json_document_type_schema)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load schemas: {}", e))
}

/// Build the publisher selected by `[output]`.
pub fn build_publisher(output: &OutputConfig) -> Result<DynPublisher> {
    match output.kind.as_str() {
        "stdout" => Ok(Box::new(JsonLinesPublisher::stdout())),
        "file" => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&output.path)
                .map_err(|e| anyhow::anyhow!("failed to open output file {}: {}", output.path, e))?;
            Ok(Box::new(JsonLinesPublisher::new("file", file)))
        }
        other => Err(anyhow::anyhow!(
            "unknown output kind '{}', expected 'stdout' or 'file'",
            other
        )),
    }
}

fn log_stats(stats: &IngestStats) {
    tracing::info!(
        received = stats.received,
        published = stats.published,
        quarantined = stats.quarantined,
        dropped = stats.dropped(),
        "ingest stopped"
    );
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl-C handler: {}", e))?;
    Ok("ctrl_c")
}
