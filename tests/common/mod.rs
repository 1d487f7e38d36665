// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared utilities for end-to-end scenario tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{connect_info::MockConnectInfo, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use user_service::{
    api::router,
    config::{
        AppConfig, ORDER_CALL_TIMEOUT_ENV, ORDER_SERVICE_URL_ENV, TOKEN_SECRET_ENV,
        TRUSTED_ADDRESSES_ENV,
    },
    state::AppState,
};

pub const SECRET: &str = "integration-secret-of-at-least-32-bytes";
pub const TRUSTED_PEER: &str = "192.168.0.15:40000";
pub const UNTRUSTED_PEER: &str = "203.0.113.9:40000";

// =============================================================================
// Mock order service
// =============================================================================

#[derive(Clone, Default)]
struct MockState {
    hits: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

/// In-process order service bound to an ephemeral port.
pub struct MockOrderService {
    pub base_url: String,
    state: MockState,
}

impl MockOrderService {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/order-service/{user_id}/orders", get(orders))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/order-service"),
            state,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

async fn orders(State(state): State<MockState>, Path(user_id): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if state.failing.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(json!([{
        "orderId": format!("{user_id}-o1"),
        "productId": "CATALOG-001",
        "qty": 2,
        "unitPrice": 1500,
        "totalPrice": 3000,
        "createdAt": "2026-01-02T03:04:05Z"
    }]))
    .into_response()
}

/// A base URL nothing listens on.
pub async fn dead_order_service_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/order-service")
}

// =============================================================================
// Application under test
// =============================================================================

pub fn config(order_service_url: &str, overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        (TOKEN_SECRET_ENV, SECRET),
        (ORDER_SERVICE_URL_ENV, order_service_url),
        (ORDER_CALL_TIMEOUT_ENV, "300"),
        (TRUSTED_ADDRESSES_ENV, "192.168.0.15"),
    ]);
    vars.extend(overrides.iter().copied());
    AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
}

/// Serve the full router on an ephemeral loopback port, with connection info,
/// the way `main` does. Returns the base URL.
pub async fn serve(config: AppConfig) -> String {
    let app = router(AppState::new(config).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{addr}")
}

pub struct TestApp {
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config).unwrap(),
        }
    }

    pub async fn request(
        &self,
        peer: &str,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let app = router(self.state.clone())
            .layer(MockConnectInfo(peer.parse::<SocketAddr>().unwrap()));

        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sign up a user and return its id.
    pub async fn signup(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                UNTRUSTED_PEER,
                Method::POST,
                "/users",
                None,
                Some(json!({ "email": email, "name": "Ursula", "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["userId"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            UNTRUSTED_PEER,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }
}
