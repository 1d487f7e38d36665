// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Order lookups for user detail responses.
//!
//! [`OrderService`] wraps [`OrderClient`] in the `order-service` circuit
//! breaker. It never fails: an open circuit, a timeout, or any client error
//! yields an empty order list and a `warn` log.

pub mod client;

use std::sync::Arc;

pub use client::{OrderClient, OrderClientError};

use crate::models::OrderSummary;
use crate::resilience::{CallError, CircuitBreaker};

/// Registry name of the breaker guarding order lookups.
pub const ORDER_SERVICE_BREAKER: &str = "order-service";

#[derive(Clone)]
pub struct OrderService {
    client: OrderClient,
    breaker: Arc<CircuitBreaker>,
}

impl OrderService {
    pub fn new(client: OrderClient, breaker: Arc<CircuitBreaker>) -> Self {
        Self { client, breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Orders for `user_id`, or an empty list when the order service cannot
    /// answer.
    pub async fn orders_for(&self, user_id: &str) -> Vec<OrderSummary> {
        self.breaker
            .run(
                || self.client.fetch_orders(user_id),
                |err: CallError<OrderClientError>| {
                    tracing::warn!(
                        user_id,
                        breaker = self.breaker.name(),
                        state = %self.breaker.state(),
                        error = %err,
                        "Order service unavailable; returning empty orders (degraded)"
                    );
                    Vec::new()
                },
            )
            .await
    }
}
