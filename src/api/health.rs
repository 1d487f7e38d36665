// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::resilience::CircuitState;
use crate::state::AppState;

/// Service status. Never includes the token signing key.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub status: String,
    pub service: String,
    pub port: u16,
    pub token_expiration_secs: u64,
    /// State of the breaker guarding order lookups.
    pub order_service: CircuitState,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health_check",
    tag = "Health",
    responses((status = 200, description = "Service status", body = HealthCheckResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        port: state.config.port,
        token_expiration_secs: state.tokens.ttl().as_secs(),
        order_service: state.orders.breaker().state(),
    })
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/welcome",
    tag = "Health",
    responses((status = 200, description = "Greeting message", body = String))
)]
pub async fn welcome(State(state): State<AppState>) -> String {
    state.config.greeting.clone()
}
