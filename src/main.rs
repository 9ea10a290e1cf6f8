#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};

mod cli;
mod config;
mod db;
mod tracker;
mod utils;
mod web;

use cli::Args;
use config::Config;
use tracker::TrackerCore;
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(port) = args.port {
        config.server.port = port;
        config.validate()?;
    }

    utils::logging::init_tracing(&config.logging);
    info!("travel tracker starting up");

    let config = Arc::new(config);

    let db_manager = Arc::new(
        db::DatabaseManager::new(&config.database)
            .await
            .context("failed to connect to the database")?,
    );
    info!("using {:?} database backend", db_manager.db_type());
    if config.database.ensure_schema {
        db_manager
            .ensure_schema()
            .await
            .context("failed to prepare the database schema")?;
    }

    let tracker = Arc::new(TrackerCore::new(
        db_manager.clone(),
        config.tracker.default_user_id,
    ));

    let web_server = WebServer::new(config.clone(), db_manager, tracker);
    let web_handle = tokio::spawn(async move { web_server.start().await });

    tokio::select! {
        result = web_handle => match result {
            Ok(Ok(())) => bail!("web server stopped unexpectedly"),
            Ok(Err(e)) => {
                error!("web server error: {:#}", e);
                return Err(e);
            }
            Err(e) => bail!("web server task failed: {}", e),
        },
        _ = shutdown_signal() => {},
    }

    info!("travel tracker shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
