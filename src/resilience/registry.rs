// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Named breakers, created on first use with shared defaults.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot};

#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    defaults: CircuitBreakerConfig,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(defaults: CircuitBreakerConfig) -> Self {
        Self {
            defaults,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Breaker for `name`, creating it with the registry defaults if needed.
    ///
    /// Every caller asking for the same name shares one breaker instance.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.read().get(name) {
            return existing.clone();
        }
        self.breakers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(breaker = name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(name, self.defaults.clone()))
            })
            .clone()
    }

    /// Snapshots of every breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<CircuitBreakerSnapshot> {
        let mut snapshots: Vec<_> = self
            .breakers
            .read()
            .values()
            .map(|breaker| breaker.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;

    #[test]
    fn same_name_returns_same_breaker() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
        let a = registry.get("order-service");
        let b = registry.get("order-service");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.config(), &CircuitBreakerConfig::default());
    }

    #[test]
    fn snapshots_list_every_breaker_sorted() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
        registry.get("zeta");
        registry.get("alpha");

        let snapshots = registry.snapshots();
        let names: Vec<_> = snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(snapshots.iter().all(|s| s.state == CircuitState::Closed));
    }
}
