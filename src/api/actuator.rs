// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operational endpoints, reachable from trusted origins only.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::resilience::CircuitBreakerSnapshot;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakersResponse {
    pub circuit_breakers: Vec<CircuitBreakerSnapshot>,
}

#[utoipa::path(
    get,
    path = "/actuator/circuitbreakers",
    tag = "Actuator",
    responses(
        (status = 200, description = "State of every circuit breaker", body = CircuitBreakersResponse),
        (status = 403, description = "Caller is not a trusted origin")
    )
)]
pub async fn circuit_breakers(State(state): State<AppState>) -> Json<CircuitBreakersResponse> {
    Json(CircuitBreakersResponse {
        circuit_breakers: state.breakers.snapshots(),
    })
}
