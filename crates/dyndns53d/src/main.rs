// # dyndns53d - Dynamic DNS HTTP daemon
//
// Thin integration layer: read configuration, build the backends named by
// it, and serve the HTTP routes until SIGTERM or SIGINT. Record logic lives
// in dyndns53-core.
//
// ## Configuration
//
// Environment variables only:
//
// - `DYNDNS_LISTEN_ADDR`: socket address (default `0.0.0.0:8080`)
// - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `DYNDNS_PROVIDER`: `route53` (default) or `memory`
// - `DYNDNS_STORAGE`: `s3` (default) or `file`
// - `DYNDNS_BUCKET`, `DYNDNS_DATABASE`: credential database object (s3)
// - `DYNDNS_DATABASE_PATH`: credential database file (file)
// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`,
//   `AWS_REGION`: AWS credentials
//
// ## Example
//
// ```bash
// export AWS_ACCESS_KEY_ID=AKIA...
// export AWS_SECRET_ACCESS_KEY=...
// export DYNDNS_BUCKET=my-dyndns-bucket
// export DYNDNS_DATABASE=hosts.csv
//
// dyndns53d
// ```

use anyhow::{Context, Result};
use dyndns53_core::{
    BackendRegistry, BlobStore, CredentialStore, Reconciler, TracedBlobStore, TracedZoneClient,
};
use dyndns53d::{AppState, DaemonConfig, router};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum Dyndns53ExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<Dyndns53ExitCode> for ExitCode {
    fn from(code: Dyndns53ExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match DaemonConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return Dyndns53ExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return Dyndns53ExitCode::ConfigError.into();
    }

    info!("Starting dyndns53d");
    info!(
        "Provider: {}, storage: {}",
        config.provider.type_name(),
        config.storage.type_name()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return Dyndns53ExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let state = match build_state(&config) {
            Ok(state) => state,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return Dyndns53ExitCode::ConfigError;
            }
        };

        match run_daemon(config.listen_addr, state).await {
            Ok(()) => Dyndns53ExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                Dyndns53ExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the backends and shared handler state
fn build_state(config: &DaemonConfig) -> Result<AppState> {
    let registry = BackendRegistry::with_builtins();

    #[cfg(feature = "aws")]
    {
        info!("Registering AWS backends");
        dyndns53_aws::register(&registry);
    }

    let zones = registry
        .create_zone_client(&config.provider)
        .context("Failed to create zone client")?;
    let reconciler = Reconciler::new(Arc::new(TracedZoneClient::new(zones)));

    let database = registry
        .create_blob_store(&config.storage)
        .context("Failed to create credential storage")?;
    info!("Credential database: {}", database.location());
    let credentials = CredentialStore::new(Arc::new(TracedBlobStore::new(database)));

    Ok(AppState::new(Arc::new(credentials), reconciler))
}

/// Serve until a shutdown signal arrives
async fn run_daemon(listen_addr: SocketAddr, state: AppState) -> Result<()> {
    let shutdown = shutdown_signal()?;

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!("Listening on {}", listen_addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let signal = shutdown.await;
        info!("Received shutdown signal: {}", signal);
    })
    .await
    .context("HTTP server failed")?;

    info!("Shutting down dyndns53d");
    Ok(())
}

/// Install SIGTERM and SIGINT handlers
///
/// Handlers are installed before the listener is bound so an early signal
/// is not lost. The returned future resolves with the signal's name.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    })
}
