// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The router served over a real TCP listener, with the peer address taken
//! from the connection.

mod common;

use common::{config, dead_order_service_url, serve};
use reqwest::StatusCode;
use serde_json::Value;
use user_service::config::TRUSTED_ADDRESSES_ENV;

#[tokio::test]
async fn protected_path_without_token_is_unauthorized() {
    let base = serve(config(&dead_order_service_url().await, &[])).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/users")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_code"], "missing_auth_header");

    let response = client.get(format!("{base}/welcome")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn actuator_follows_connection_peer_address() {
    let order_url = dead_order_service_url().await;
    let client = reqwest::Client::new();

    let trusted = serve(config(&order_url, &[(TRUSTED_ADDRESSES_ENV, "127.0.0.1")])).await;
    let response = client
        .get(format!("{trusted}/actuator/circuitbreakers"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["circuitBreakers"].is_array());

    let untrusted = serve(config(&order_url, &[])).await;
    let response = client
        .get(format!("{untrusted}/actuator/circuitbreakers"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
