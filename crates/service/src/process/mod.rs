mod signals;

use tokio::sync::watch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::{Config, ConfigError, ServiceState, StateSetupError};

pub use signals::{log_panics, relay_stop, StopSignals};

/// Install the global tracing subscriber: compact lines on a non-blocking
///  stdout writer, filtered by `RUST_LOG` with `level` as the default.
///
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_tracing(level: tracing::Level) -> Result<WorkerGuard, ProcessError> {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .try_init()
        .map_err(|e| ProcessError::Tracing(e.to_string()))?;

    Ok(guard)
}

/// Build the service state from `config` and hold it until `shutdown`
///  fires, then tear it down.
pub async fn run(config: &Config, mut shutdown: watch::Receiver<()>) -> Result<(), ProcessError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        email_enabled = config.email_enabled,
        "service starting up"
    );

    let state = ServiceState::from_config(config).await?;
    tracing::info!("service ready");

    let _ = shutdown.changed().await;

    tracing::info!("shutting down");
    state.shutdown();
    Ok(())
}

/// Full process lifecycle: tracing, panic logging, signal handling and
///  [`run`].
pub async fn spawn_service(config: &Config) -> Result<(), ProcessError> {
    let _guard = init_tracing(config.log_level()?)?;
    log_panics();

    let stop = StopSignals::install()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let relay = tokio::spawn(relay_stop(stop.recv(), shutdown_tx));
    let result = run(config, shutdown_rx).await;
    relay.abort();

    if let Err(e) = &result {
        tracing::error!("service error: {}", e);
    }
    result
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("state setup error: {0}")]
    StateSetup(#[from] StateSetupError),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
