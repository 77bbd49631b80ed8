// Product route definitions.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};

use super::handler;
use crate::api::middleware::auth::{require_admin, require_auth};
use crate::api::middleware::rate_limit::{rate_limit, RateLimitTier};
use crate::config::state::AppState;

/// Creates the product routers: public reads and admin-gated mutations.
pub fn product_routes(state: AppState) -> Router<AppState> {
    let public: Router<AppState> = Router::new()
        .route("/api/products/{id}", get(handler::get_product))
        .route_layer(from_fn_with_state(
            (state.clone(), RateLimitTier::Default),
            rate_limit,
        ));

    // Layer ordering: rate limit -> auth -> admin gate.
    let admin: Router<AppState> = Router::new()
        .route("/api/products", post(handler::create_product))
        .route("/api/products/{id}", delete(handler::delete_product))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .route_layer(from_fn_with_state((state, RateLimitTier::Admin), rate_limit));

    public.merge(admin)
}
