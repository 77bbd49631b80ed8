// Authentication route definitions.

use axum::{middleware::from_fn_with_state, routing::post, Router};

use super::handler;
use crate::api::middleware::rate_limit::{rate_limit, RateLimitTier};
use crate::config::state::AppState;

/// Creates the auth router; both endpoints sit behind the AUTH rate tier.
pub fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(handler::register))
        .route("/api/auth/login", post(handler::login))
        .route_layer(from_fn_with_state((state, RateLimitTier::Auth), rate_limit))
}
