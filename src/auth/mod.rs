// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication and Authorization
//!
//! ## Login
//!
//! 1. Client posts `{email, password}` to `/login`
//! 2. [`CredentialVerifier`] compares the password with the stored Argon2 hash
//! 3. [`TokenService`] signs an HS512 token whose `sub` is the user id
//! 4. The token is returned in the `token` header and the JSON body
//!
//! ## Every other request
//!
//! The [`access_gateway`] middleware asks the [`AccessPolicy`] first. Only
//! when the matching rule needs an identity does it validate
//! `Authorization: Bearer <token>`.
//!
//! ## Security
//!
//! - Tokens are stateless; nothing is stored server-side
//! - All token failures look identical to the caller
//! - Unknown emails and wrong passwords take the same time to reject

pub mod claims;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod policy;
pub mod token;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use credentials::{hash_secret, CredentialVerifier, HashError};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::access_gateway;
pub use policy::{AccessPolicy, AccessRequest, Decision, DenyReason, PathPattern, Predicate};
pub use token::{IssuedToken, TokenError, TokenService};
