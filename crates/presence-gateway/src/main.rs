//! Presence gateway client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p presence-gateway -- --config config.yml
//! ```
//!
//! Configuration is loaded from the YAML file, with `PRESENCE_*`
//! environment overrides.

use anyhow::Context;
use clap::Parser;
use presence_common::{
    try_init_tracing_with_config, AppConfig, ConfigCredential, FileConfigSource,
    JsonFileElapsedStore, TracingConfig,
};
use presence_gateway::build_number::resolve_build_number;
use presence_gateway::{GatewayConnection, GatewayError, GatewayOptions, WsConnector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// Keeps a custom presence displayed through the gateway
#[derive(Parser, Debug)]
#[command(name = "presence-gateway", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "PRESENCE_CONFIG", default_value = "config.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match AppConfig::load(&args.config, true) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Failed to load configuration from {}: {e}",
                args.config.display()
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::from_logging(&config.logging)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    print_banner(&args.config, &config);

    let code = match run(args.config, config).await {
        Ok(()) => 0,
        Err(e) => {
            let code = e.downcast_ref::<GatewayError>().map_or(1, GatewayError::exit_code);
            error!(error = %format!("{e:#}"), exit_code = code, "Exiting");
            code
        }
    };
    std::process::exit(code);
}

async fn run(config_path: PathBuf, config: AppConfig) -> anyhow::Result<()> {
    let build_number =
        resolve_build_number(config.gateway.build_number, &config.gateway.user_agent).await;
    let options = GatewayOptions::from_config(&config, build_number);

    let store = JsonFileElapsedStore::new(config.elapsed_path(&config_path));
    info!(path = %store.path().display(), "Elapsed time storage");

    let credentials = ConfigCredential::new(config_path.clone());
    let reload_interval = Duration::from_secs(config.runtime.reload_interval_secs());
    let source = FileConfigSource::spawn(config_path, config, reload_interval)
        .context("Failed to start configuration watcher")?;

    let connector = WsConnector::new(options.handshake_timeout);
    let (connection, handle) =
        GatewayConnection::new(Box::new(connector), options, Arc::new(store));

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        handle.stop();
    });

    connection.start(source, credentials).await?;
    Ok(())
}

fn print_banner(config_path: &Path, config: &AppConfig) {
    let presence = &config.presence;
    let application = if presence.application_id.trim().is_empty() {
        "none"
    } else {
        presence.application_id.as_str()
    };

    println!("presence-gateway {}", env!("CARGO_PKG_VERSION"));
    println!("  config      : {}", config_path.display());
    println!("  activity    : {} (type {})", presence.game_name, presence.activity_type);
    println!("  status      : {}", presence.status);
    println!("  timer       : {}", presence.start_time_mode);
    println!("  application : {application}");
    println!("  buttons     : {}", presence.buttons.len());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
