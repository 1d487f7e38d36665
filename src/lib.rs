// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User Service - identity, access policy and resilient order lookups
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password login, HS512 identity tokens, and the access policy gateway
//! - `orders` - Order service client behind a circuit breaker
//! - `resilience` - Circuit breakers and their registry
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod orders;
pub mod resilience;
pub mod state;
pub mod store;
