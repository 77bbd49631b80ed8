use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::middleware::auth::{session_key, AuthContext};
use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::{ApiError, ApiResult};
use crate::utils::response_handler::ApiResponse;
use crate::validation::issue::ValidationIssue;
use crate::validation::object_id::ObjectId;
use crate::validation::validators::{validate_email, validate_password, verify_password};

const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// DTOs
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct StoredUser {
    pub id: ObjectId,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
}

pub fn user_key(email: &str) -> String {
    format!("user:{}", email)
}

fn validate_credentials(email: &str, password: &str) -> ApiResult<(String, String)> {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    let email: Option<String> = match validate_email(email) {
        Ok(normalized) => Some(normalized),
        Err(issue) => {
            issues.push(issue);
            None
        }
    };
    let password: Option<String> = match validate_password(password) {
        Ok(trimmed) => Some(trimmed),
        Err(issue) => {
            issues.push(issue);
            None
        }
    };

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::validation(issues));
    };
    Ok((email, password))
}

async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
        .await
        .map_err(|err| ApiError::internal(format!("Password hashing task failed: {}", err)))?
        .map_err(|err| ApiError::internal(format!("Failed to process password: {}", err)))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Register a new user.
#[instrument(name = "register", skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<ApiResponse> {
    // 1. Validate input
    let (email, password) = validate_credentials(&payload.email, &payload.password)?;

    // 2. Reject duplicate emails
    if state.cache.get(CacheNamespace::User, &user_key(&email)).await.is_some() {
        return Err(ApiError::conflict("Email already registered."));
    }

    // 3. Hash password off the async runtime
    let password_hash: String = hash_password(password, state.env.bcrypt_cost).await?;

    // 4. Store user
    let user: StoredUser = StoredUser {
        id: ObjectId::new(),
        email: email.clone(),
        password_hash,
        full_name: payload.full_name,
        is_admin: false,
    };
    state
        .cache
        .set(CacheNamespace::User, &user_key(&email), serde_json::to_value(&user)?, None)
        .await?;

    info!("Registered user {}", user.id);

    Ok(ApiResponse::new(StatusCode::CREATED)
        .data(json!({ "user_id": user.id, "email": user.email })))
}

/// Login and create a session.
#[instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<ApiResponse> {
    // 1. Validate input
    let (email, password) = validate_credentials(&payload.email, &payload.password)?;

    // 2. Fetch user. The failure message never reveals whether the email or
    //    the password was wrong.
    let stored: serde_json::Value = state
        .cache
        .get(CacheNamespace::User, &user_key(&email))
        .await
        .ok_or_else(|| ApiError::authentication("Invalid email or password."))?;
    let user: StoredUser = serde_json::from_value(stored)?;

    // 3. Verify password
    verify_password(&password, &user.password_hash)
        .await
        .map_err(|_| ApiError::authentication("Invalid email or password."))?;

    // 4. Create session
    let token: String = Uuid::new_v4().to_string();
    let context: AuthContext = AuthContext {
        user_id: user.id,
        email: user.email.clone(),
        is_admin: user.is_admin,
    };
    state
        .cache
        .set(
            CacheNamespace::User,
            &session_key(&token),
            serde_json::to_value(&context)?,
            Some(SESSION_TTL),
        )
        .await?;

    // 5. Return token
    Ok(ApiResponse::ok().data(json!({ "token": token, "user_id": user.id })))
}
