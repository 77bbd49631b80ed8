use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::api::middleware::auth::AuthContext;
use crate::api::products::handler::product_key;
use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::{ApiError, ApiResult};
use crate::utils::response_handler::ApiResponse;
use crate::validation::issue::ValidationIssue;
use crate::validation::object_id::ObjectId;
use crate::validation::validators::validate_object_id;

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

pub fn reviews_key(product_id: &ObjectId) -> String {
    format!("reviews:{}", product_id)
}

/// Adds a review to a product.
#[instrument(name = "create_review", skip(state, payload), fields(user = %context.user_id))]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(product_id): Path<String>,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<ApiResponse> {
    let product_id: ObjectId = validate_object_id(&product_id)?;

    if state
        .cache
        .get(CacheNamespace::Product, &product_key(&product_id))
        .await
        .is_none()
    {
        return Err(ApiError::not_found("Product not found."));
    }

    let mut issues: Vec<ValidationIssue> = Vec::new();
    if !(1..=5).contains(&payload.rating) {
        issues.push(ValidationIssue::field(
            "rating",
            "out_of_range",
            "Rating must be between 1 and 5.",
        ));
    }
    if payload.comment.trim().is_empty() {
        issues.push(ValidationIssue::field("comment", "required", "Comment is required."));
    }
    if !issues.is_empty() {
        return Err(ApiError::validation(issues));
    }

    let review: Value = json!({
        "user_id": context.user_id,
        "rating": payload.rating,
        "comment": payload.comment.trim(),
        "created_at": Utc::now().to_rfc3339(),
    });

    // Reviews live alongside the product, keyed by the product id.
    let mut reviews: Vec<Value> = state
        .cache
        .get(CacheNamespace::Product, &reviews_key(&product_id))
        .await
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    reviews.push(review.clone());

    state
        .cache
        .set(CacheNamespace::Product, &reviews_key(&product_id), json!(reviews), None)
        .await?;

    Ok(ApiResponse::new(StatusCode::CREATED).data(review))
}

/// Lists a product's reviews.
#[instrument(name = "list_reviews", skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<ApiResponse> {
    let product_id: ObjectId = validate_object_id(&product_id)?;

    if state
        .cache
        .get(CacheNamespace::Product, &product_key(&product_id))
        .await
        .is_none()
    {
        return Err(ApiError::not_found("Product not found."));
    }

    let reviews: Value = state
        .cache
        .get(CacheNamespace::Product, &reviews_key(&product_id))
        .await
        .unwrap_or_else(|| json!([]));

    let count: usize = reviews.as_array().map(Vec::len).unwrap_or(0);

    Ok(ApiResponse::ok().data(reviews).meta(json!({ "count": count })))
}
