use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/user/signup
        .route("/api/user/signup", post(handlers::signup))
        // POST /api/user/signin
        // Returns a token signed with the secret of the account's role.
        .route("/api/user/signin", post(handlers::signin))
}
