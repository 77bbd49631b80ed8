// Image upload route definitions.

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::post,
    Router,
};

use super::handler;
use crate::api::middleware::auth::{require_admin, require_auth};
use crate::api::middleware::rate_limit::{rate_limit, RateLimitTier};
use crate::config::state::AppState;
use crate::validation::validators::MAX_IMAGE_SIZE_BYTES;

/// Creates the upload router; admin only.
///
/// The route-level body limit overrides the global default, which is
/// smaller than the image cap; the validator stays the authority on size.
pub fn upload_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/products/{id}/image", post(handler::upload_product_image))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .route_layer(from_fn_with_state((state, RateLimitTier::Admin), rate_limit))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE_BYTES as usize))
}
