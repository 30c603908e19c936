use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod cards;
pub mod employees;
pub mod system;

/// Endpoints reachable without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/auth/token", post(auth::refresh_token))
}

/// Endpoints that require a verified access token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/v1/auth/profile", get(auth::profile))
        .merge(employees::router())
        .merge(cards::router())
}
