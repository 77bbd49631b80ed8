// Review route definitions.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use super::handler;
use crate::api::middleware::auth::require_auth;
use crate::api::middleware::rate_limit::{rate_limit, RateLimitTier};
use crate::config::state::AppState;

/// Creates the review routers: public listing, authenticated creation.
pub fn review_routes(state: AppState) -> Router<AppState> {
    let public: Router<AppState> = Router::new()
        .route("/api/products/{id}/reviews", get(handler::list_reviews))
        .route_layer(from_fn_with_state(
            (state.clone(), RateLimitTier::Default),
            rate_limit,
        ));

    let authenticated: Router<AppState> = Router::new()
        .route("/api/products/{id}/reviews", post(handler::create_review))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .route_layer(from_fn_with_state((state, RateLimitTier::Strict), rate_limit));

    public.merge(authenticated)
}
