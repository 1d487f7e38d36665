// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and credential verification.
//!
//! Secrets are stored as Argon2id PHC strings. Verification of an unknown
//! email still runs a full Argon2 comparison against a throwaway hash, so the
//! two failure cases take the same time.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::sync::RwLock;

use crate::store::InMemoryStore;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// Hash `secret` with a fresh random salt.
///
/// CPU bound; call from a blocking context.
pub fn hash_secret(secret: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError(e.to_string()))
}

/// Compare `secret` to a stored PHC string. Any parse failure is a mismatch.
fn secret_matches(secret: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Checks submitted credentials against the user store.
pub struct CredentialVerifier {
    store: Arc<RwLock<InMemoryStore>>,
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(store: Arc<RwLock<InMemoryStore>>) -> Result<Self, HashError> {
        let dummy_hash = hash_secret(&uuid::Uuid::new_v4().to_string())?;
        Ok(Self { store, dummy_hash })
    }

    /// True only when `email` exists and `secret` matches its stored hash.
    pub async fn verify(&self, email: &str, secret: &str) -> bool {
        self.authenticate(email, secret).await.is_some()
    }

    /// The user id behind `email` when `secret` matches, otherwise `None`.
    pub async fn authenticate(&self, email: &str, secret: &str) -> Option<String> {
        let candidate = {
            let store = self.store.read().await;
            store
                .find_by_email(email)
                .map(|user| (user.user_id.clone(), user.password_hash.clone()))
        };

        let (user_id, phc) = match candidate {
            Some((id, phc)) => (Some(id), phc),
            None => (None, self.dummy_hash.clone()),
        };

        let secret = secret.to_string();
        let matched = tokio::task::spawn_blocking(move || secret_matches(&secret, &phc))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Credential check task failed");
                false
            });

        match (matched, user_id) {
            (true, Some(id)) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewUser;

    async fn verifier_with_user(email: &str, secret: &str) -> (CredentialVerifier, String) {
        let store = Arc::new(RwLock::new(InMemoryStore::new()));
        let user = store
            .write()
            .await
            .create(NewUser {
                email: email.to_string(),
                name: "Ursula".to_string(),
                password_hash: hash_secret(secret).unwrap(),
            })
            .unwrap();
        (CredentialVerifier::new(store).unwrap(), user.user_id)
    }

    #[test]
    fn hashes_are_salted_phc_strings() {
        let a = hash_secret("correct-horse").unwrap();
        let b = hash_secret("correct-horse").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(secret_matches("correct-horse", &a));
        assert!(!secret_matches("wrong-horse", &a));
    }

    #[test]
    fn unparseable_hash_never_matches() {
        assert!(!secret_matches("anything", "not-a-phc-string"));
        assert!(!secret_matches("", ""));
    }

    #[tokio::test]
    async fn correct_secret_authenticates() {
        let (verifier, user_id) = verifier_with_user("u1@example.com", "correct-horse").await;
        assert!(verifier.verify("u1@example.com", "correct-horse").await);
        assert_eq!(
            verifier.authenticate("u1@example.com", "correct-horse").await,
            Some(user_id)
        );
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_email_both_fail() {
        let (verifier, _) = verifier_with_user("u1@example.com", "correct-horse").await;
        assert!(!verifier.verify("u1@example.com", "wrong-horse").await);
        assert!(!verifier.verify("nobody@example.com", "correct-horse").await);
        assert!(!verifier.verify("", "").await);
    }
}
