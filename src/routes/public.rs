use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints accessible to anonymous clients.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /users
        // Sign-up.
        .route("/users", post(handlers::create_user))
        // POST /users/log-in
        // Exchanges credentials for a bearer token.
        .route("/users/log-in", post(handlers::log_in))
}
