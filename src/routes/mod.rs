// ABOUTME: HTTP route handlers for the Pantry API
// ABOUTME: Groups the REST endpoints for ingredients and service health
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! HTTP routes for the Pantry API.

/// Service health endpoints
pub mod health;
/// Ingredient catalog endpoints
pub mod ingredients;

pub use health::HealthRoutes;
pub use ingredients::IngredientRoutes;
