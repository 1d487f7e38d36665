// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Security-boundary errors.
//!
//! Every token failure renders the same `invalid_token` code so callers
//! cannot tell an expired token from a forged one. The specific
//! [`TokenError`] is kept for logging only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::token::TokenError;

#[derive(Debug)]
pub enum AuthError {
    /// Unknown email or wrong password
    InvalidCredentials,
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    InvalidAuthHeader,
    /// Token failed validation
    InvalidToken(TokenError),
    /// Policy denied the request
    AccessDenied,
    /// Internal error
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::AccessDenied => "access_denied",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::AccessDenied => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::InvalidToken(_) => write!(f, "Token is invalid"),
            AuthError::AccessDenied => write!(f, "Access denied"),
            AuthError::Internal(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::InvalidToken(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::InvalidToken(reason) => {
                tracing::info!(reason = %reason, "Rejected identity token");
            }
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Authentication failure");
            }
            _ => {}
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn every_token_error_looks_the_same() {
        let mut bodies = Vec::new();
        for reason in [
            TokenError::Expired,
            TokenError::InvalidSignature,
            TokenError::Malformed,
        ] {
            let response = AuthError::from(reason).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(body_of(response).await);
        }
        assert!(bodies.iter().all(|b| b == &bodies[0]));
        assert_eq!(bodies[0]["error_code"], "invalid_token");
    }

    #[tokio::test]
    async fn access_denied_returns_403() {
        let response = AuthError::AccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn internal_detail_is_not_rendered() {
        let response = AuthError::Internal("connect info missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert!(!body["error"].as_str().unwrap().contains("connect info"));
    }
}
