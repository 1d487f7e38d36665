// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity token issuance and validation.
//!
//! Tokens are HS512 JWTs carrying `sub`, `iat` and `exp`. Nothing is stored
//! server-side: a token is valid exactly when its signature checks out under
//! the server key and the wall clock has not passed `exp`.
//!
//! Expiry is checked before the signature, so an expired token always reports
//! [`TokenError::Expired`] whether or not it was signed by us.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::TokenClaims;
use crate::config::TokenConfig;

const ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub expires_at: i64,
}

/// Signs and verifies identity tokens with a server-held key.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue_token(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue_token_at(subject, Utc::now().timestamp())
    }

    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate_token_at(token, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    pub fn issue_token_at(&self, subject: &str, now: i64) -> Result<IssuedToken, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Malformed)?;
        Ok(IssuedToken {
            token,
            subject: claims.sub,
            expires_at: claims.exp,
        })
    }

    /// Validate a token as if the current time were `now` (unix seconds).
    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        // Structural decode first so expiry wins over a bad signature.
        let unverified = jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
            .map_err(|_| TokenError::Malformed)?;
        if now > unverified.claims.exp {
            return Err(TokenError::Expired);
        }

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is enforced above against the caller-supplied clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let verified =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::InvalidSignature
                    | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                        TokenError::InvalidSignature
                    }
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?;

        if verified.claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }
        Ok(verified.claims)
    }
}
