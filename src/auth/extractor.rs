// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers that need the caller's identity:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, AuthenticatedUser, TokenService};
use crate::state::AppState;

/// Extractor for the identity bound to the current request.
///
/// The access gateway normally establishes identity before the handler runs
/// and leaves it in request extensions. When it has not (for example on a
/// public path), the bearer token is validated here instead.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user = authenticate(&parts.headers, &state.tokens)?;
        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Validate the bearer token in `headers` and build the caller's identity.
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.validate_token(token)?;
    Ok(AuthenticatedUser::from_claims(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenError;
    use axum::http::{HeaderValue, Request};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_requires_header_and_scheme() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[tokio::test]
    async fn extractor_prefers_identity_from_extensions() {
        let state = AppState::for_tests();
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(AuthenticatedUser {
            user_id: "from-gateway".to_string(),
            expires_at: 0,
        });

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "from-gateway");
    }

    #[tokio::test]
    async fn extractor_validates_bearer_token() {
        let state = AppState::for_tests();
        let issued = state.tokens.issue_token("user-7").unwrap();
        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user-7");
        assert_eq!(user.expires_at, issued.expires_at);
    }

    #[tokio::test]
    async fn extractor_rejects_bad_token() {
        let state = AppState::for_tests();
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer not-a-token")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let err = Auth::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::InvalidToken(TokenError::Malformed)));
    }
}
