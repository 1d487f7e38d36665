// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated identity bound to a request.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried inside an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Identity established for the lifetime of one request.
///
/// The gateway inserts this into request extensions after a token validates;
/// handlers read it back through the [`Auth`](super::Auth) extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: String,

    /// Token expiration (unix seconds), not serialized
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_claims_uses_subject_as_user_id() {
        let user = AuthenticatedUser::from_claims(TokenClaims {
            sub: "user_123".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        });
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.expires_at, 1_700_003_600);
    }

    #[test]
    fn serialized_user_omits_expiry() {
        let user = AuthenticatedUser {
            user_id: "user_123".to_string(),
            expires_at: 42,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": "user_123" }));
    }
}
