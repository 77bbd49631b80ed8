// Order route definitions.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use super::handler;
use crate::api::middleware::auth::require_auth;
use crate::api::middleware::rate_limit::{rate_limit, RateLimitTier};
use crate::config::state::AppState;

/// Creates the order router; everything requires authentication and the
/// STRICT rate tier.
pub fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(handler::create_order))
        .route("/api/orders/{id}", get(handler::get_order))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .route_layer(from_fn_with_state((state, RateLimitTier::Strict), rate_limit))
}
