// ABOUTME: Main library entry point for the Pantry API server
// ABOUTME: Provides REST CRUD over a catalog of ingredients with nutrition variants and custom units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Pantry Server
//!
//! A REST service managing a catalog of food ingredients. Each ingredient
//! owns serving-size specific nutrition **variants** and ingredient-specific
//! **custom units**; all three entity kinds are exposed through CRUD
//! endpoints backed by `SQLite`.
//!
//! Whole-ingredient updates are reconciled rather than blindly replaced:
//! nested items are matched against the submitted representation by natural
//! key (variant description, custom-unit name), so surrogate ids survive
//! updates and the store only ever deletes what actually disappeared.
//!
//! ## Architecture
//!
//! - **models**: domain entities, submitted drafts, the closed unit set
//! - **matcher**: pure key-based set matching for nested collections
//! - **validation**: write-time invariants on submitted drafts
//! - **reconcile**: merges a draft onto the persisted aggregate
//! - **database**: `SQLite` store with explicit aggregate cascades
//! - **routes**: axum REST handlers
//! - **server**: router assembly, middleware, serving

/// Environment-based configuration
pub mod config;

/// `SQLite` persistence for the ingredient catalog
pub mod database;

/// Unified error handling with `AppError` and `ErrorCode`
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Key-based set matching for nested collections
pub mod matcher;

/// HTTP middleware (CORS)
pub mod middleware;

/// Domain model and submitted representations
pub mod models;

/// Aggregate reconciliation of submitted ingredient representations
pub mod reconcile;

/// HTTP route handlers
pub mod routes;

/// Server assembly and shared resources
pub mod server;

/// Write-time validation of submitted drafts
pub mod validation;
