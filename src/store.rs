// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user store.
//!
//! Users are keyed by their opaque id with a secondary index on email.
//! Emails are compared case-insensitively.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::UserRecord;

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<String, UserRecord>,
    ids_by_email: HashMap<String, String>,
}

/// Fields for a user that does not exist yet.
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, new_user: NewUser) -> Result<UserRecord, ApiError> {
        let email = new_user.email.trim().to_string();
        let key = email_key(&email);
        if self.ids_by_email.contains_key(&key) {
            return Err(ApiError::conflict("A user with this email already exists"));
        }

        let record = UserRecord {
            user_id: Uuid::new_v4().to_string(),
            email,
            name: new_user.name.trim().to_string(),
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        self.ids_by_email.insert(key, record.user_id.clone());
        self.users.insert(record.user_id.clone(), record.clone());
        Ok(record)
    }

    pub fn find_by_id(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.ids_by_email
            .get(&email_key(email))
            .and_then(|id| self.users.get(id))
    }

    /// Every user, oldest first.
    pub fn find_all(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn new_user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[test]
    fn create_assigns_id_and_indexes_email() {
        let mut store = InMemoryStore::new();
        let created = store.create(new_user("u1@example.com", "Ursula")).unwrap();

        assert!(Uuid::parse_str(&created.user_id).is_ok());
        assert_eq!(store.find_by_id(&created.user_id), Some(&created));
        assert_eq!(store.find_by_email("U1@Example.com"), Some(&created));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let mut store = InMemoryStore::new();
        store.create(new_user("u1@example.com", "Ursula")).unwrap();
        let err = store
            .create(new_user(" U1@example.com ", "Someone Else"))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(store.find_all().len(), 1);
    }

    #[test]
    fn unknown_lookups_return_none() {
        let store = InMemoryStore::new();
        assert!(store.find_by_id("missing").is_none());
        assert!(store.find_by_email("missing@example.com").is_none());
        assert!(store.find_all().is_empty());
    }

    #[test]
    fn find_all_is_oldest_first() {
        let mut store = InMemoryStore::new();
        let first = store.create(new_user("a@example.com", "Alpha")).unwrap();
        let second = store.create(new_user("b@example.com", "Bravo")).unwrap();

        let all = store.find_all();
        let first_pos = all.iter().position(|u| u.user_id == first.user_id).unwrap();
        let second_pos = all.iter().position(|u| u.user_id == second.user_id).unwrap();
        assert!(first.created_at <= second.created_at);
        if first.created_at < second.created_at {
            assert!(first_pos < second_pos);
        }
    }
}
