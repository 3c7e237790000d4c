pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<services::user_service::UserService>,
    pub auth_service: Arc<services::auth_service::AuthService>,
    pub token_issuer: Arc<auth::token::TokenIssuer>,
    pub pool: sqlx::SqlitePool,
}

/// Builds the full application router: public auth endpoints plus the
/// bearer-protected profile and user-directory surface.
pub fn app_router(state: AppState, limiter: middleware::RateLimiter) -> Router {
    let protected = Router::new()
        .route("/auth/profile", get(handlers::profile))
        .route("/users", get(handlers::list_users))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .with_state(state)
}
