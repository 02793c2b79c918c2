// ABOUTME: HTTP middleware for the Pantry API
// ABOUTME: Currently hosts the CORS layer configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! HTTP middleware.

/// CORS layer configuration
pub mod cors;

pub use cors::setup_cors;
