// ABOUTME: Server binary for the Pantry API
// ABOUTME: Loads configuration, initializes logging and the database, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Pantry API Server Binary
//!
//! This binary starts the ingredient catalog REST service with structured
//! logging and a SQLite-backed store.

use anyhow::Result;
use clap::Parser;
use pantry_server::{
    config::ServerConfig,
    database::Database,
    logging,
    server::{PantryServer, ServerResources},
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "pantry-server")]
#[command(about = "Pantry API - ingredient catalog REST service")]
struct Args {
    /// Override the database URL
    #[arg(short, long)]
    database_url: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Pantry API server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    info!("Database initialized");

    let resources = Arc::new(ServerResources::new(database, config));
    PantryServer::new(resources).run().await
}
