// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{AccessPolicy, CredentialVerifier, HashError, TokenService};
use crate::config::AppConfig;
use crate::orders::{OrderClient, OrderClientError, OrderService, ORDER_SERVICE_BREAKER};
use crate::resilience::CircuitBreakerRegistry;
use crate::store::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    OrderClient(#[from] OrderClientError),

    #[error(transparent)]
    Credentials(#[from] HashError),
}

/// Everything handlers and middleware share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<CredentialVerifier>,
    pub policy: Arc<AccessPolicy>,
    pub orders: OrderService,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, StateError> {
        Self::with_store(config, InMemoryStore::new())
    }

    pub fn with_store(config: AppConfig, store: InMemoryStore) -> Result<Self, StateError> {
        let store = Arc::new(RwLock::new(store));
        let breakers = Arc::new(CircuitBreakerRegistry::new(config.breaker.clone()));
        let client = OrderClient::new(config.order_service_url.clone(), config.breaker.call_timeout)?;
        let orders = OrderService::new(client, breakers.get(ORDER_SERVICE_BREAKER));

        Ok(Self {
            tokens: Arc::new(TokenService::new(&config.token)),
            credentials: Arc::new(CredentialVerifier::new(store.clone())?),
            policy: Arc::new(AccessPolicy::from_config(&config.access)),
            store,
            orders,
            breakers,
            config: Arc::new(config),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(crate::config::test_config()).expect("test state builds")
    }
}
