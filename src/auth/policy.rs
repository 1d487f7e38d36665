// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Policy
//!
//! An ordered list of `{pattern, predicate}` rules. The first rule whose
//! pattern matches the request decides; a request no rule matches is denied.
//!
//! The standard policy built from [`AccessConfig`] is:
//!
//! | Order | Pattern | Predicate |
//! |-------|---------|-----------|
//! | 1 | each `PUBLIC_PATHS` entry | [`Predicate::AlwaysAllow`] |
//! | 2 | each `TRUSTED_PATHS` entry | [`Predicate::SourceAddressInSet`] |
//! | 3 | `/**` | [`Predicate::RequiresAuthenticatedIdentity`] |
//! | - | anything else | deny |
//!
//! ## Patterns
//!
//! - `/welcome` matches that path exactly (a trailing slash is ignored)
//! - `/users/*` matches exactly one segment after `/users`
//! - `/health/**` matches `/health` and everything below it
//! - `POST /users` matches only `POST` requests to `/users`

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

use axum::http::Method;

use crate::config::AccessConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern {0:?} must start with '/'")]
    Relative(String),

    #[error("pattern {0:?} has an invalid HTTP method")]
    InvalidMethod(String),

    #[error("pattern {0:?} uses '**' before the final segment")]
    MisplacedWildcard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
}

/// A path pattern with an optional method restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    method: Option<Method>,
    segments: Vec<Segment>,
    /// Pattern ends in `/**`.
    any_suffix: bool,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        let (method, path) = match raw.split_once(char::is_whitespace) {
            Some((method, path)) => {
                let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|_| PatternError::InvalidMethod(raw.to_string()))?;
                (Some(method), path.trim())
            }
            None => (None, raw),
        };

        if !path.starts_with('/') {
            return Err(PatternError::Relative(raw.to_string()));
        }

        let parts: Vec<&str> = split_path(path).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut any_suffix = false;
        for (i, part) in parts.iter().enumerate() {
            match *part {
                "**" if i + 1 == parts.len() => any_suffix = true,
                "**" => return Err(PatternError::MisplacedWildcard(raw.to_string())),
                "*" => segments.push(Segment::Any),
                literal => segments.push(Segment::Literal(literal.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            method,
            segments,
            any_suffix,
        })
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(expected) = &self.method {
            if expected != method {
                return false;
            }
        }

        let mut parts = split_path(path);
        for segment in &self.segments {
            match (segment, parts.next()) {
                (Segment::Any, Some(_)) => {}
                (Segment::Literal(lit), Some(part)) if lit == part => {}
                _ => return false,
            }
        }
        self.any_suffix || parts.next().is_none()
    }

    /// True for patterns such as `/**` that accept every request.
    pub fn matches_everything(&self) -> bool {
        self.method.is_none() && self.segments.is_empty() && self.any_suffix
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    AlwaysAllow,
    SourceAddressInSet(HashSet<IpAddr>),
    RequiresAuthenticatedIdentity,
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub predicate: Predicate,
}

impl AccessRule {
    pub fn new(pattern: PathPattern, predicate: Predicate) -> Self {
        Self { pattern, predicate }
    }
}

/// What the policy is asked to judge.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub source: IpAddr,
    pub has_identity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The matching rule needs an identity the request does not carry yet.
    Unauthenticated,
    /// The matching rule is restricted to trusted origins.
    UntrustedSource,
    /// No rule matched.
    NoMatchingRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Immutable, ordered authorization rules.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    /// A policy evaluating `rules` in order, denying anything unmatched.
    pub fn new(rules: Vec<AccessRule>) -> Self {
        for rule in &rules {
            if rule.predicate == Predicate::AlwaysAllow && rule.pattern.matches_everything() {
                tracing::warn!(
                    pattern = %rule.pattern,
                    "Public pattern matches every path; authentication is effectively disabled"
                );
            }
        }
        Self { rules }
    }

    /// Public paths, then trusted-origin paths, then authenticated-only.
    pub fn from_config(config: &AccessConfig) -> Self {
        let capacity = config.public_paths.len() + config.trusted_paths.len() + 1;
        let mut rules = Vec::with_capacity(capacity);
        rules.extend(
            config
                .public_paths
                .iter()
                .cloned()
                .map(|p| AccessRule::new(p, Predicate::AlwaysAllow)),
        );
        rules.extend(config.trusted_paths.iter().cloned().map(|p| {
            AccessRule::new(
                p,
                Predicate::SourceAddressInSet(config.trusted_addresses.clone()),
            )
        }));
        rules.push(AccessRule::new(
            PathPattern {
                raw: "/**".to_string(),
                method: None,
                segments: Vec::new(),
                any_suffix: true,
            },
            Predicate::RequiresAuthenticatedIdentity,
        ));
        Self::new(rules)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn decide(&self, request: &AccessRequest<'_>) -> Decision {
        let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.pattern.matches(request.method, request.path))
        else {
            return Decision::Deny(DenyReason::NoMatchingRule);
        };

        let decision = match &rule.predicate {
            Predicate::AlwaysAllow => Decision::Allow,
            Predicate::SourceAddressInSet(allowed) => {
                if allowed.contains(&request.source.to_canonical()) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::UntrustedSource)
                }
            }
            Predicate::RequiresAuthenticatedIdentity => {
                if request.has_identity {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::Unauthenticated)
                }
            }
        };

        tracing::debug!(
            method = %request.method,
            path = request.path,
            source = %request.source,
            rule = %rule.pattern,
            ?decision,
            "Access decision"
        );
        decision
    }
}
