// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SheetWerk — spreadsheet-to-PDF conversion service.
//
// Entry point. Initialises logging, loads configuration and fonts, starts the
// retention sweep, and serves the HTTP API until interrupted.

use std::sync::Arc;

use sheetwerk_core::ServerConfig;
use sheetwerk_core::error::Result;
use sheetwerk_document::FontBook;
use sheetwerk_server::services::spawn_retention;
use sheetwerk_server::{AppState, router};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Environment variable naming an optional JSON configuration file.
const CONFIG_ENV: &str = "SHEETWERK_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("SheetWerk starting");

    let config = load_config()?;
    let fonts = match &config.font_dir {
        Some(dir) => FontBook::with_font_dir(dir)?,
        None => FontBook::embedded()?,
    };
    info!(faces = fonts.len(), families = ?fonts.families(), "Fonts ready");

    let state = AppState::new(config, fonts)?;
    let _sweeper = spawn_retention(Arc::clone(&state.store), state.config.retention_hours);

    let listener = TcpListener::bind((state.config.host.as_str(), state.config.port)).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SheetWerk stopped");
    Ok(())
}

fn load_config() -> Result<ServerConfig> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!(%path, "Loading configuration file");
            ServerConfig::from_file(&path)?
        }
        Err(_) => ServerConfig::default(),
    };
    Ok(config.apply_env())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
