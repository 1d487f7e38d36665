// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{hash_secret, Auth},
    error::ApiError,
    models::{CreateUserRequest, UserDetailResponse, UserResponse},
    state::AppState,
    store::NewUser,
};

/// Sign up a new user.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    tag = "Users",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_secret(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    let record = state.store.write().await.create(NewUser {
        email: request.email,
        name: request.name,
        password_hash,
    })?;

    tracing::info!(user_id = %record.user_id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&record))))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [UserResponse]),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserResponse>> {
    let store = state.store.read().await;
    Json(store.find_all().iter().map(UserResponse::from).collect())
}

/// Get one user with their orders.
///
/// Orders come from the order service through its circuit breaker; when that
/// service is unavailable the list is empty and the response is still 200.
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = String, Path, description = "Identifier of the user")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserDetailResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Auth(caller): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let user = {
        let store = state.store.read().await;
        store.find_by_id(&user_id).map(UserResponse::from)
    }
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::debug!(caller = %caller.user_id, user_id = %user.user_id, "Fetching orders");
    let orders = state.orders.orders_for(&user.user_id).await;
    Ok(Json(UserDetailResponse::new(user, orders)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;

    fn signup(email: &str) -> Json<CreateUserRequest> {
        Json(CreateUserRequest {
            email: email.to_string(),
            name: "Ursula".to_string(),
            password: "correct-horse".to_string(),
        })
    }

    fn caller() -> Auth {
        Auth(AuthenticatedUser {
            user_id: "caller".to_string(),
            expires_at: i64::MAX,
        })
    }

    #[tokio::test]
    async fn create_user_stores_hashed_password() {
        let state = AppState::for_tests();
        let (status, Json(created)) = create_user(State(state.clone()), signup("u1@example.com"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.email, "u1@example.com");

        let store = state.store.read().await;
        let record = store.find_by_id(&created.user_id).unwrap();
        assert!(record.password_hash.starts_with("$argon2id$"));
        assert!(!record.password_hash.contains("correct-horse"));
    }

    #[tokio::test]
    async fn create_user_rejects_invalid_and_duplicate() {
        let state = AppState::for_tests();
        let err = create_user(State(state.clone()), signup("not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let (status, _) = create_user(State(state.clone()), signup("u1@example.com"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let err = create_user(State(state), signup("u1@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn list_users_returns_public_projection() {
        let state = AppState::for_tests();
        let _first = create_user(State(state.clone()), signup("a@example.com")).await.unwrap();
        let _second = create_user(State(state.clone()), signup("b@example.com")).await.unwrap();

        let Json(users) = list_users(State(state)).await;
        assert_eq!(users.len(), 2);
        let json = serde_json::to_string(&users).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[tokio::test]
    async fn get_unknown_user_is_404_without_order_call() {
        let state = AppState::for_tests();
        let err = get_user(caller(), Path("missing".to_string()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(state.orders.breaker().snapshot().buffered_calls, 0);
    }

    #[tokio::test]
    async fn get_user_degrades_to_empty_orders() {
        let state = AppState::for_tests();
        let (_, Json(created)) = create_user(State(state.clone()), signup("u1@example.com"))
            .await
            .unwrap();

        let Json(detail) = get_user(caller(), Path(created.user_id.clone()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(detail.user_id, created.user_id);
        assert!(detail.orders.is_empty());
        assert_eq!(state.orders.breaker().snapshot().failed_calls, 1);
    }
}
