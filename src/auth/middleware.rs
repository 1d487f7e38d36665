// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access gateway middleware.
//!
//! Runs in front of every route:
//!
//! 1. Ask the policy with no identity. Public paths and trusted-origin paths
//!    are decided here without touching the token.
//! 2. If the matching rule needs an identity, validate the bearer token and
//!    bind the resulting [`AuthenticatedUser`] into request extensions.
//! 3. Anything else is forbidden.
//!
//! The source address is the TCP peer from [`ConnectInfo`] (or
//! `MockConnectInfo` when the router is driven without a listener); forwarding
//! headers are ignored. A request without connection info is refused.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::authenticate;
use super::policy::{AccessRequest, Decision, DenyReason};
use super::AuthError;
use crate::state::AppState;

pub async fn access_gateway(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let peer = ConnectInfo::<SocketAddr>::from_request_parts(&mut parts, &state).await;
    let mut request = Request::from_parts(parts, body);
    let source = match peer {
        Ok(ConnectInfo(addr)) => addr.ip(),
        Err(_) => {
            return AuthError::Internal("peer address unavailable".to_string()).into_response()
        }
    };

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let anonymous = AccessRequest {
        method: &method,
        path: &path,
        source,
        has_identity: false,
    };

    match state.policy.decide(&anonymous) {
        Decision::Allow => return next.run(request).await,
        Decision::Deny(DenyReason::Unauthenticated) => {}
        Decision::Deny(reason) => {
            tracing::warn!(%method, path = %path, %source, ?reason, "Access denied");
            return AuthError::AccessDenied.into_response();
        }
    }

    let user = match authenticate(request.headers(), &state.tokens) {
        Ok(user) => user,
        Err(err) => {
            tracing::info!(
                %method,
                path = %path,
                %source,
                code = err.error_code(),
                "Unauthenticated request"
            );
            return err.into_response();
        }
    };

    let identified = AccessRequest {
        has_identity: true,
        ..anonymous
    };
    if !state.policy.decide(&identified).is_allowed() {
        tracing::warn!(%method, path = %path, %source, user_id = %user.user_id, "Access denied");
        return AuthError::AccessDenied.into_response();
    }

    tracing::debug!(user_id = %user.user_id, "Identity established");
    request.extensions_mut().insert(user);
    next.run(request).await
}
