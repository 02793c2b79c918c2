// ABOUTME: Database management for the ingredient catalog
// ABOUTME: Owns the SQLite pool, runs migrations and hands out entity managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Database Management
//!
//! This module provides database functionality for the Pantry API server: a
//! pooled `SQLite` connection, startup migrations, and access to the
//! ingredient aggregate store.

pub mod ingredients;

pub use ingredients::{IngredientsManager, ListIngredientsFilter};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::errors::{AppError, AppResult};

/// Database handle for the ingredient catalog
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection and run migrations.
    ///
    /// The database file is created when it does not exist yet; foreign keys
    /// are enforced on every connection so nested rows live and die with
    /// their parent.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot be built or migrations fail.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives and dies with its connection, so the
        // pool is pinned to a single long-lived one.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePool::connect_with(options).await
        }
        .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the ingredient aggregate manager
    #[must_use]
    pub fn ingredients(&self) -> IngredientsManager {
        IngredientsManager::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a migration statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                weight_to_volume_factor REAL,
                conversion_weight_unit TEXT,
                conversion_volume_unit TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_variants (
                id TEXT PRIMARY KEY,
                ingredient_id TEXT NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                description TEXT NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                unit TEXT,
                serving_size REAL,
                calories REAL,
                carbohydrate REAL,
                fat REAL,
                protein REAL,
                saturated_fat REAL,
                sodium REAL,
                sugar REAL,
                UNIQUE (ingredient_id, description)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_variants_ingredient
            ON ingredient_variants(ingredient_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        // Durable backstop for the single-default invariant
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_variants_single_default
            ON ingredient_variants(ingredient_id) WHERE is_default = 1
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS custom_units (
                id TEXT PRIMARY KEY,
                ingredient_id TEXT NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                conversion_factor REAL,
                conversion_unit TEXT,
                UNIQUE (ingredient_id, name)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_custom_units_ingredient
            ON custom_units(ingredient_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
