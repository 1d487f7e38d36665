// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the order service.
//!
//! One `GET {base}/{user_id}/orders` per lookup. No retries: failures are
//! returned as-is and handled by the circuit breaker in front of this client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::models::OrderSummary;

#[derive(Debug, thiserror::Error)]
pub enum OrderClientError {
    #[error("order client configuration invalid: {0}")]
    Config(String),

    #[error("order request failed: {0}")]
    Request(String),

    #[error("order service returned {0}")]
    Status(StatusCode),

    #[error("order response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct OrderClient {
    base_url: Url,
    http: Client,
}

impl OrderClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, OrderClientError> {
        if base_url.cannot_be_a_base() {
            return Err(OrderClientError::Config(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| OrderClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    /// `{base}/{user_id}/orders`, with `user_id` percent-encoded as one segment.
    pub fn orders_url(&self, user_id: &str) -> Result<Url, OrderClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OrderClientError::Config("base URL has no path".to_string()))?
            .pop_if_empty()
            .push(user_id)
            .push("orders");
        Ok(url)
    }

    pub async fn fetch_orders(&self, user_id: &str) -> Result<Vec<OrderSummary>, OrderClientError> {
        let url = self.orders_url(user_id)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OrderClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrderClientError::Status(status));
        }

        response
            .json::<Vec<OrderSummary>>()
            .await
            .map_err(|e| OrderClientError::InvalidResponse(e.to_string()))
    }
}
