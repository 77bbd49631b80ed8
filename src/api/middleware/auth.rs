// Bearer-token authentication and the admin gate.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::ApiError;
use crate::validation::object_id::ObjectId;
use crate::validation::validators::validate_bearer;

/// Authenticated caller, stored in request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: ObjectId,
    pub email: String,
    pub is_admin: bool,
}

pub fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

/// Middleware requiring a valid `Authorization: Bearer <token>` header
/// backed by a live session.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header: &str = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Not authorized. No token."))?;

    let token: &str =
        validate_bearer(header).map_err(|_| ApiError::authentication("Invalid token format."))?;

    let session: serde_json::Value = state
        .cache
        .get(CacheNamespace::User, &session_key(token))
        .await
        .ok_or_else(|| ApiError::authentication("Not authorized."))?;

    let context: AuthContext = serde_json::from_value(session)
        .map_err(|_| ApiError::authentication("Not authorized."))?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Middleware gating admin-only routes; runs after [`require_auth`].
pub async fn require_admin(
    Extension(context): Extension<AuthContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !context.is_admin {
        return Err(ApiError::authorization("Not authorized as an admin."));
    }
    Ok(next.run(request).await)
}
