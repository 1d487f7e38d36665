// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resilience for calls to dependencies we do not control.
//!
//! ```text
//! handler
//!     → CircuitBreakerRegistry::get("order-service")
//!     → CircuitBreaker::run(primary, fallback)
//!         → short-circuit to fallback while open
//!         → primary() bounded by the call timeout
//!         → outcome recorded in the sliding window
//! ```

pub mod circuit_breaker;
pub mod registry;

pub use circuit_breaker::{
    CallError, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
};
pub use registry::CircuitBreakerRegistry;
