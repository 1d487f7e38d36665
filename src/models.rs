// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API, plus the stored user record.
//! Wire types use camelCase field names and derive `ToSchema` for the
//! OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Users**: sign-up requests, stored records, public projections
//! - **Login**: credential submission and the issued token
//! - **Orders**: read-only projection returned by the order service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

pub const MIN_EMAIL_LEN: usize = 2;
pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// User Models
// =============================================================================

/// A user as held by the store.
///
/// `password_hash` is an Argon2id PHC string and never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload for signing up a new user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Login identifier; must contain `@`.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Plain-text password, hashed before storage.
    #[serde(alias = "pwd")]
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let email = self.email.trim();
        if email.chars().count() < MIN_EMAIL_LEN || !email.contains('@') {
            return Err(ApiError::bad_request(format!(
                "Email must be at least {MIN_EMAIL_LEN} characters and contain '@'"
            )));
        }
        if self.name.trim().chars().count() < MIN_NAME_LEN {
            return Err(ApiError::bad_request(format!(
                "Name must be at least {MIN_NAME_LEN} characters"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Public projection of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub email: String,
    pub name: String,
    pub user_id: String,
}

impl From<&UserRecord> for UserResponse {
    fn from(record: &UserRecord) -> Self {
        Self {
            email: record.email.clone(),
            name: record.name.clone(),
            user_id: record.user_id.clone(),
        }
    }
}

/// A user together with their orders.
///
/// `orders` is empty when the order service is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub email: String,
    pub name: String,
    pub user_id: String,
    pub orders: Vec<OrderSummary>,
}

impl UserDetailResponse {
    pub fn new(user: UserResponse, orders: Vec<OrderSummary>) -> Self {
        Self {
            email: user.email,
            name: user.name,
            user_id: user.user_id,
            orders,
        }
    }
}

// =============================================================================
// Login Models
// =============================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Issued identity token. The same values are sent in the `token` and
/// `user-id` response headers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    /// Expiration (unix seconds).
    pub expires_at: i64,
}

// =============================================================================
// Order Models
// =============================================================================

/// An order as reported by the order service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    pub product_id: String,
    pub qty: u32,
    pub unit_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
