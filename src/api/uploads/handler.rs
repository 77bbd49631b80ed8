use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
};
use serde_json::json;
use tracing::{info, instrument};

use crate::api::products::handler::product_key;
use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::{ApiError, ApiResult};
use crate::utils::response_handler::ApiResponse;
use crate::validation::object_id::ObjectId;
use crate::validation::validators::{validate_image_upload, validate_object_id, ImageUpload};

fn header_str<'a>(headers: &'a HeaderMap, name: &str, default: &'a str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(default)
}

/// Attaches an image to a product (admin only).
///
/// The image metadata is assembled from the raw body and headers, then
/// validated before anything else happens; there is no storage backend, so
/// only the validated metadata is recorded on the product.
#[instrument(name = "upload_product_image", skip(state, headers, body))]
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ApiResponse> {
    let product_id: ObjectId = validate_object_id(&product_id)?;

    let mut product: serde_json::Value = state
        .cache
        .get(CacheNamespace::Product, &product_key(&product_id))
        .await
        .ok_or_else(|| ApiError::not_found("Product not found."))?;

    let mimetype: &str = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let upload: ImageUpload<'_> = ImageUpload {
        field_name: header_str(&headers, "x-upload-field", "image").to_string(),
        original_name: header_str(&headers, "x-file-name", "").to_string(),
        encoding: header_str(&headers, "content-transfer-encoding", "binary").to_string(),
        mimetype: mimetype.to_string(),
        buffer: &body,
        size: body.len() as u64,
    };
    validate_image_upload(&upload).map_err(ApiError::validation)?;

    product["image"] = json!({
        "original_name": upload.original_name,
        "mimetype": upload.mimetype,
        "size": upload.size,
    });
    state
        .cache
        .set(CacheNamespace::Product, &product_key(&product_id), product.clone(), None)
        .await?;

    info!("Attached image to product {}", product_id);

    Ok(ApiResponse::ok().data(product))
}
