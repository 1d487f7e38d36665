// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup, validated, and
//! then shared immutably through [`AppState`](crate::state::AppState).
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_SECRET` | HMAC key used to sign identity tokens (>= 32 bytes) | Required |
//! | `TOKEN_EXPIRATION_SECS` | Identity token lifetime | `86400` |
//! | `PUBLIC_PATHS` | Patterns reachable without identity | see [`DEFAULT_PUBLIC_PATHS`] |
//! | `TRUSTED_PATHS` | Patterns reachable only from trusted origins | `/actuator/**` |
//! | `TRUSTED_ADDRESSES` | Exact IP addresses of trusted origins | `127.0.0.1,::1` |
//! | `ORDER_SERVICE_URL` | Base URL of the order service | `http://127.0.0.1:8000/order-service` |
//! | `ORDER_CALL_TIMEOUT_MS` | Deadline for one order-service call | `1000` |
//! | `REQUEST_TIMEOUT_SECS` | Deadline for a whole inbound request | `30` |
//! | `CB_FAILURE_RATE_THRESHOLD` | Failure percentage that must be exceeded to open | `50` |
//! | `CB_SLIDING_WINDOW_SIZE` | Number of recent calls in the window | `10` |
//! | `CB_MINIMUM_CALLS` | Calls recorded before the rate is evaluated | `5` |
//! | `CB_OPEN_COOLDOWN_SECS` | Time spent open before probing | `30` |
//! | `CB_HALF_OPEN_PERMITTED_CALLS` | Trial calls let through while half-open | `1` |
//! | `GREETING_MESSAGE` | Body of `GET /welcome` | `Welcome to the User Service.` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,user_service=debug,tower_http=debug` |
//!
//! List values are comma separated. A path pattern may carry an HTTP method
//! prefix, e.g. `POST /users`.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::policy::PathPattern;
use crate::resilience::CircuitBreakerConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TOKEN_SECRET_ENV: &str = "TOKEN_SECRET";
pub const TOKEN_EXPIRATION_ENV: &str = "TOKEN_EXPIRATION_SECS";
pub const PUBLIC_PATHS_ENV: &str = "PUBLIC_PATHS";
pub const TRUSTED_PATHS_ENV: &str = "TRUSTED_PATHS";
pub const TRUSTED_ADDRESSES_ENV: &str = "TRUSTED_ADDRESSES";
pub const ORDER_SERVICE_URL_ENV: &str = "ORDER_SERVICE_URL";
pub const ORDER_CALL_TIMEOUT_ENV: &str = "ORDER_CALL_TIMEOUT_MS";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const CB_FAILURE_RATE_ENV: &str = "CB_FAILURE_RATE_THRESHOLD";
pub const CB_WINDOW_SIZE_ENV: &str = "CB_SLIDING_WINDOW_SIZE";
pub const CB_MINIMUM_CALLS_ENV: &str = "CB_MINIMUM_CALLS";
pub const CB_OPEN_COOLDOWN_ENV: &str = "CB_OPEN_COOLDOWN_SECS";
pub const CB_HALF_OPEN_CALLS_ENV: &str = "CB_HALF_OPEN_PERMITTED_CALLS";
pub const GREETING_ENV: &str = "GREETING_MESSAGE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Paths that never require identity or a trusted origin.
pub const DEFAULT_PUBLIC_PATHS: &str =
    "/health_check,/health/**,/welcome,/login,POST /users,/docs/**,/api-doc/**";
pub const DEFAULT_TRUSTED_PATHS: &str = "/actuator/**";
pub const DEFAULT_TRUSTED_ADDRESSES: &str = "127.0.0.1,::1";
pub const DEFAULT_ORDER_SERVICE_URL: &str = "http://127.0.0.1:8000/order-service";
pub const DEFAULT_GREETING: &str = "Welcome to the User Service.";

/// HMAC-SHA512 keys shorter than this are rejected.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Token signing settings.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: Vec<u8>,
    pub ttl: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Inputs to the authorization policy.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub public_paths: Vec<PathPattern>,
    pub trusted_paths: Vec<PathPattern>,
    pub trusted_addresses: HashSet<IpAddr>,
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub token: TokenConfig,
    pub access: AccessConfig,
    pub order_service_url: Url,
    pub request_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
    pub greeting: String,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = get(TOKEN_SECRET_ENV).ok_or(ConfigError::Missing(TOKEN_SECRET_ENV))?;
        if secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(ConfigError::invalid(
                TOKEN_SECRET_ENV,
                format!("must be at least {MIN_TOKEN_SECRET_LEN} bytes"),
            ));
        }

        let ttl_secs: u64 = parse_or(&get, TOKEN_EXPIRATION_ENV, 86_400)?;
        if ttl_secs == 0 {
            return Err(ConfigError::invalid(TOKEN_EXPIRATION_ENV, "must be positive"));
        }

        let public_paths = parse_patterns(
            PUBLIC_PATHS_ENV,
            &get(PUBLIC_PATHS_ENV).unwrap_or_else(|| DEFAULT_PUBLIC_PATHS.to_string()),
        )?;
        let trusted_paths = parse_patterns(
            TRUSTED_PATHS_ENV,
            &get(TRUSTED_PATHS_ENV).unwrap_or_else(|| DEFAULT_TRUSTED_PATHS.to_string()),
        )?;
        let trusted_addresses = parse_addresses(
            &get(TRUSTED_ADDRESSES_ENV).unwrap_or_else(|| DEFAULT_TRUSTED_ADDRESSES.to_string()),
        )?;

        let order_service_url = parse_base_url(
            &get(ORDER_SERVICE_URL_ENV).unwrap_or_else(|| DEFAULT_ORDER_SERVICE_URL.to_string()),
        )?;

        let call_timeout_ms: u64 = parse_or(&get, ORDER_CALL_TIMEOUT_ENV, 1_000)?;
        let request_timeout_secs: u64 = parse_or(&get, REQUEST_TIMEOUT_ENV, 30)?;
        let call_timeout = Duration::from_millis(call_timeout_ms);
        let request_timeout = Duration::from_secs(request_timeout_secs);
        if call_timeout.is_zero() || call_timeout >= request_timeout {
            return Err(ConfigError::invalid(
                ORDER_CALL_TIMEOUT_ENV,
                format!("must be positive and shorter than {REQUEST_TIMEOUT_ENV}"),
            ));
        }

        let breaker = CircuitBreakerConfig {
            failure_rate_threshold: parse_or(&get, CB_FAILURE_RATE_ENV, 50.0)?,
            sliding_window_size: parse_or(&get, CB_WINDOW_SIZE_ENV, 10)?,
            minimum_calls: parse_or(&get, CB_MINIMUM_CALLS_ENV, 5)?,
            open_cooldown: Duration::from_secs(parse_or(&get, CB_OPEN_COOLDOWN_ENV, 30)?),
            half_open_permitted_calls: parse_or(&get, CB_HALF_OPEN_CALLS_ENV, 1)?,
            call_timeout,
        };
        breaker.validate()?;

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, PORT_ENV, 8080)?,
            token: TokenConfig {
                secret: secret.into_bytes(),
                ttl: Duration::from_secs(ttl_secs),
            },
            access: AccessConfig {
                public_paths,
                trusted_paths,
                trusted_addresses,
            },
            order_service_url,
            request_timeout,
            breaker,
            greeting: get(GREETING_ENV).unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, e.to_string())),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_patterns(name: &'static str, raw: &str) -> Result<Vec<PathPattern>, ConfigError> {
    split_list(raw)
        .map(|p| PathPattern::parse(p).map_err(|e| ConfigError::invalid(name, e.to_string())))
        .collect()
}

fn parse_addresses(raw: &str) -> Result<HashSet<IpAddr>, ConfigError> {
    split_list(raw)
        .map(|a| {
            a.parse::<IpAddr>()
                .map(|ip| ip.to_canonical())
                .map_err(|e| ConfigError::invalid(TRUSTED_ADDRESSES_ENV, format!("{a}: {e}")))
        })
        .collect()
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::invalid(ORDER_SERVICE_URL_ENV, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::invalid(
            ORDER_SERVICE_URL_ENV,
            "must be an absolute http(s) URL",
        ));
    }
    Ok(url)
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig::from_lookup(|name| match name {
        TOKEN_SECRET_ENV => Some("test-secret-that-is-at-least-32-bytes-long".to_string()),
        ORDER_SERVICE_URL_ENV => Some("http://127.0.0.1:9/order-service".to_string()),
        ORDER_CALL_TIMEOUT_ENV => Some("200".to_string()),
        _ => None,
    })
    .expect("test configuration is valid")
}
