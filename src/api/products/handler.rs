use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::{ApiError, ApiResult};
use crate::utils::response_handler::ApiResponse;
use crate::validation::issue::ValidationIssue;
use crate::validation::object_id::ObjectId;
use crate::validation::validators::validate_object_id;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
}

pub fn product_key(id: &ObjectId) -> String {
    format!("product:{}", id)
}

/// Creates a product (admin only).
#[instrument(name = "create_product", skip(state, payload), fields(product_name = %payload.name))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<ApiResponse> {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    if payload.name.trim().is_empty() {
        issues.push(ValidationIssue::field("name", "required", "Product name is required."));
    }
    if payload.price <= 0.0 {
        issues.push(ValidationIssue::field(
            "price",
            "too_small",
            "Price must be a positive number.",
        ));
    }
    if !issues.is_empty() {
        return Err(ApiError::validation(issues));
    }

    let id: ObjectId = ObjectId::new();
    let product: serde_json::Value = json!({
        "id": id,
        "name": payload.name.trim(),
        "description": payload.description,
        "price": payload.price,
    });

    state
        .cache
        .set(CacheNamespace::Product, &product_key(&id), product.clone(), None)
        .await?;

    info!("Created product {}", id);

    Ok(ApiResponse::new(StatusCode::CREATED).data(product))
}

/// Fetches a product by id.
#[instrument(name = "get_product", skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    let id: ObjectId = validate_object_id(&id)?;

    let product: serde_json::Value = state
        .cache
        .get(CacheNamespace::Product, &product_key(&id))
        .await
        .ok_or_else(|| ApiError::not_found("Product not found."))?;

    Ok(ApiResponse::ok().data(product))
}

/// Deletes a product (admin only).
#[instrument(name = "delete_product", skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    let id: ObjectId = validate_object_id(&id)?;

    if !state.cache.delete(CacheNamespace::Product, &product_key(&id)).await {
        return Err(ApiError::not_found("Product not found."));
    }

    info!("Deleted product {}", id);

    Ok(ApiResponse::ok().data(json!({ "deleted": true, "id": id })))
}
