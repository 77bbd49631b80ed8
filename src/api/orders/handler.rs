use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::api::middleware::auth::AuthContext;
use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::{ApiError, ApiResult};
use crate::utils::response_handler::ApiResponse;
use crate::validation::issue::ValidationIssue;
use crate::validation::object_id::ObjectId;
use crate::validation::validators::{validate_object_id, ShippingAddress};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: u32,
}

pub fn order_key(id: &ObjectId) -> String {
    format!("order:{}", id)
}

fn validate_items(items: &[OrderItemRequest]) -> Result<Vec<serde_json::Value>, Vec<ValidationIssue>> {
    let mut issues: Vec<ValidationIssue> = Vec::new();
    let mut validated: Vec<serde_json::Value> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match validate_object_id(&item.product_id) {
            Ok(product_id) => {
                if item.quantity == 0 {
                    issues.push(ValidationIssue::at(
                        vec!["items".into(), index.into(), "quantity".into()],
                        "too_small",
                        "Quantity must be at least 1.",
                    ));
                } else {
                    validated.push(json!({ "product_id": product_id, "quantity": item.quantity }));
                }
            }
            Err(_) => issues.push(ValidationIssue::at(
                vec!["items".into(), index.into(), "productId".into()],
                "invalid_format",
                "Invalid ObjectId format.",
            )),
        }
    }

    if issues.is_empty() {
        Ok(validated)
    } else {
        Err(issues)
    }
}

/// Creates an order for the authenticated user.
#[instrument(name = "create_order", skip(state, payload), fields(user = %context.user_id))]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<ApiResponse> {
    // An order with no items never reaches validation of the rest.
    if payload.items.is_empty() {
        return Err(ApiError::empty_cart("Cart is empty."));
    }

    let mut issues: Vec<ValidationIssue> = Vec::new();
    if let Err(address_issues) = payload.shipping_address.validate() {
        issues.extend(address_issues);
    }
    let items: Vec<serde_json::Value> = match validate_items(&payload.items) {
        Ok(items) => items,
        Err(item_issues) => {
            issues.extend(item_issues);
            Vec::new()
        }
    };
    if !issues.is_empty() {
        return Err(ApiError::validation(issues));
    }

    let id: ObjectId = ObjectId::new();
    let order: serde_json::Value = json!({
        "id": id,
        "user_id": context.user_id,
        "items": items,
        "shipping_address": payload.shipping_address,
        "created_at": Utc::now().to_rfc3339(),
    });

    state
        .cache
        .set(CacheNamespace::Order, &order_key(&id), order.clone(), None)
        .await?;

    info!("Created order {} for user {}", id, context.user_id);

    Ok(ApiResponse::new(StatusCode::CREATED).data(order))
}

/// Fetches an order; only its owner may read it.
#[instrument(name = "get_order", skip(state), fields(user = %context.user_id))]
pub async fn get_order(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    let id: ObjectId = validate_object_id(&id)?;

    let order: serde_json::Value = state
        .cache
        .get(CacheNamespace::Order, &order_key(&id))
        .await
        .ok_or_else(|| ApiError::not_found("Order not found."))?;

    let owner: &str = order["user_id"].as_str().unwrap_or_default();
    if owner != context.user_id.to_string() {
        return Err(ApiError::authorization("Not authorized."));
    }

    Ok(ApiResponse::ok().data(order))
}
