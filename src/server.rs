// ABOUTME: HTTP server assembly for the Pantry API
// ABOUTME: Owns the shared resources, builds the router stack and serves it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Server assembly.
//!
//! `ServerResources` bundles the shared state every handler needs; the server
//! merges the route groups, layers tracing and CORS on top, and serves the
//! result over a `tokio` TCP listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::database::Database;
use crate::middleware::setup_cors;
use crate::routes::{HealthRoutes, IngredientRoutes};

/// Shared resources injected into every route handler
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the shared server state
    #[must_use]
    pub const fn new(database: Database, config: ServerConfig) -> Self {
        Self { database, config }
    }
}

/// The Pantry API HTTP server
pub struct PantryServer {
    resources: Arc<ServerResources>,
}

impl PantryServer {
    /// Create a new server around the shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the full router with middleware layers applied
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .merge(HealthRoutes::routes())
            .merge(IngredientRoutes::routes(self.resources.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(setup_cors(&self.resources.config))
    }

    /// Bind the configured port and serve until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot bind or the server fails
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.resources.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!("HTTP server listening on {addr}");
        axum::serve(listener, self.router())
            .await
            .context("HTTP server terminated")?;
        Ok(())
    }
}
