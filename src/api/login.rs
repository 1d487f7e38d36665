// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential submission.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    Json,
};

use crate::{
    auth::AuthError,
    models::{LoginRequest, LoginResponse},
    state::AppState,
};

pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("token");
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("user-id");

/// Exchange an email and password for an identity token.
///
/// The token is returned in the `token` header and in the body. Unknown
/// emails and wrong passwords produce the same 401.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Token issued", body = LoginResponse,
            headers(
                ("token" = String, description = "Identity token"),
                ("user-id" = String, description = "Authenticated user id")
            )
        ),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, HeaderMap, Json<LoginResponse>), AuthError> {
    let Some(user_id) = state
        .credentials
        .authenticate(&request.email, &request.password)
        .await
    else {
        tracing::debug!("Login rejected");
        return Err(AuthError::InvalidCredentials);
    };

    let issued = state
        .tokens
        .issue_token(&user_id)
        .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_HEADER, header_value(&issued.token)?);
    headers.insert(USER_ID_HEADER, header_value(&issued.subject)?);

    tracing::info!(user_id = %issued.subject, "Token issued");
    Ok((
        StatusCode::CREATED,
        headers,
        Json(LoginResponse {
            token: issued.token,
            user_id: issued.subject,
            expires_at: issued.expires_at,
        }),
    ))
}

fn header_value(value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value).map_err(|e| AuthError::Internal(e.to_string()))
}
