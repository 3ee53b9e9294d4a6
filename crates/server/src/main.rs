use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use snote_service::NoteService;

use snote_server::api::{AppState, router};
use snote_server::config::SnoteConfig;
use snote_server::error::ServerError;
use snote_server::{store_factory, sweeper, telemetry};

/// Self-destructing notes HTTP server.
#[derive(Parser, Debug)]
#[command(name = "snote-server", about = "HTTP server for self-destructing notes")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "snote.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the note store schema for the configured backend, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = Path::new(&cli.config);
    let mut config = SnoteConfig::load(config_path)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    telemetry::init(&config.logging);

    if !config_path.exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    if let Some(Commands::Migrate) = cli.command {
        return run_migrate(&config).await;
    }

    let repository = store_factory::create_repository(&config.store).await?;
    info!(backend = %config.store.backend, "note store ready");

    let mut builder = NoteService::builder().repository(repository);
    if let Some(timeout) = config.service.storage_timeout() {
        builder = builder.storage_timeout(timeout);
    }
    let notes = Arc::new(builder.build().map_err(ServerError::from)?);

    let shutdown = CancellationToken::new();
    let sweeper = (config.store.sweep_interval_seconds > 0).then(|| {
        sweeper::spawn(
            Arc::clone(&notes),
            Duration::from_secs(config.store.sweep_interval_seconds),
            shutdown.clone(),
        )
    });

    let state = AppState {
        notes,
        max_body_bytes: config.server.max_body_bytes,
    };
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ServerError::Config(format!("invalid bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "snote server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped accepting connections, shutting down");
    shutdown.cancel();

    if let Some(handle) = sweeper {
        let grace = Duration::from_secs(config.server.shutdown_timeout_seconds);
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "sweeper task failed"),
            Err(_) => warn!(
                timeout_seconds = config.server.shutdown_timeout_seconds,
                "sweeper did not stop in time"
            ),
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Build the configured store, which applies its schema, then exit.
async fn run_migrate(config: &SnoteConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(backend = %config.store.backend, "running migrations");
    store_factory::create_repository(&config.store).await?;
    info!("migrations complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
