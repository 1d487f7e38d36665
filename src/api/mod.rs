// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::access_gateway,
    models::{
        CreateUserRequest, LoginRequest, LoginResponse, OrderSummary, UserDetailResponse,
        UserResponse,
    },
    resilience::{CircuitBreakerSnapshot, CircuitState},
    state::AppState,
};

pub mod actuator;
pub mod health;
pub mod login;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router.
///
/// Every route, documentation included, sits behind the access gateway. The
/// server must be started with connection info so the gateway can see the
/// peer address.
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout =
        TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.request_timeout);

    let routes = Router::new()
        .route("/health_check", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/welcome", get(health::welcome))
        .route("/login", post(login::login))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{user_id}", get(users::get_user))
        .route("/actuator/circuitbreakers", get(actuator::circuit_breakers))
        .with_state(state.clone());

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(state, access_gateway))
        .layer(CorsLayer::permissive())
        .layer(timeout)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::liveness,
        health::welcome,
        login::login,
        users::create_user,
        users::list_users,
        users::get_user,
        actuator::circuit_breakers
    ),
    components(
        schemas(
            CreateUserRequest,
            UserResponse,
            UserDetailResponse,
            OrderSummary,
            LoginRequest,
            LoginResponse,
            CircuitState,
            CircuitBreakerSnapshot,
            health::HealthCheckResponse,
            health::HealthResponse,
            actuator::CircuitBreakersResponse
        )
    ),
    tags(
        (name = "Health", description = "Health and greeting"),
        (name = "Auth", description = "Credential exchange"),
        (name = "Users", description = "User sign-up and lookup"),
        (name = "Actuator", description = "Operational views for trusted origins")
    )
)]
struct ApiDoc;
