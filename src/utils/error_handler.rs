// Centralized error handling: the typed error taxonomy, the terminal
// error-envelope writer and the tower-layer error mapping.
//
// Validators and handlers never write error responses themselves; every
// failure propagates here and this is the only place an error status and
// body are chosen.

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use chrono::Utc;
use http_body_util::LengthLimitError;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};
use std::backtrace::Backtrace;
use std::error::Error;
use tower::timeout::error::Elapsed;
use tracing::error;

use crate::validation::issue::{format_issues, issue_details, ValidationIssue};

/// Fixed error taxonomy. The wire value is the SCREAMING_SNAKE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Internal,
    BadRequest,
    RateLimit,
    DatabaseError,
    EmptyCart,
}

impl ErrorKind {
    /// Wire code placed in the error envelope.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Authentication => "AUTHENTICATION",
            ErrorKind::Authorization => "AUTHORIZATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::DatabaseError => "DATABASE_ERROR",
            ErrorKind::EmptyCart => "EMPTY_CART",
        }
    }

    /// Default HTTP status for the kind. The admin gate and other
    /// authorization failures answer 401, matching the auth header contract.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Authentication | ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal | ErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::BadRequest | ErrorKind::EmptyCart => StatusCode::BAD_REQUEST,
            ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

// Whether error envelopes carry the captured backtrace. Set once at startup
// from EXPOSE_STACK_TRACES; unset (unit tests, early failures) falls back to
// the build profile.
static EXPOSE_STACK_TRACES: OnceCell<bool> = OnceCell::new();

pub fn set_stack_exposure(enabled: bool) {
    let _ = EXPOSE_STACK_TRACES.set(enabled);
}

fn stack_exposure() -> bool {
    EXPOSE_STACK_TRACES.get().copied().unwrap_or(cfg!(debug_assertions))
}

/// A typed request failure carrying its intended status code.
///
/// The status is explicit on the error value (kind default plus an optional
/// override) instead of being inferred from the response state later.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub issues: Vec<ValidationIssue>,
    status_override: Option<StatusCode>,
    stack: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            issues: Vec::new(),
            status_override: None,
            stack: Backtrace::capture().to_string(),
        }
    }

    /// Overrides the kind's default status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_override = Some(status);
        self
    }

    /// Aggregated validation failure; the display message is the formatted
    /// issue list.
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        let message: String = format_issues(&issues);
        let mut err: ApiError = Self::new(ErrorKind::Validation, message);
        err.issues = issues;
        err
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DatabaseError, message)
    }

    pub fn empty_cart(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyCart, message)
    }

    /// The status this error answers with.
    pub fn status(&self) -> StatusCode {
        self.status_override.unwrap_or_else(|| self.kind.status())
    }
}

impl From<ValidationIssue> for ApiError {
    fn from(issue: ValidationIssue) -> Self {
        Self::validation(vec![issue])
    }
}

impl From<Vec<ValidationIssue>> for ApiError {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self::validation(issues)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("Serialization failed: {}", err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

// Terminal error writer: builds the error envelope
// {success, code, timestamp, errors, stack?} at the error's status.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.status();
        error!(code = self.kind.code(), status = %status, "{}", self.message);

        let errors: Vec<Value> = if self.issues.is_empty() {
            vec![json!({
                "path": [],
                "message": self.message,
                "code": self.kind.code(),
            })]
        } else {
            issue_details(&self.issues)
        };

        let mut body: Value = json!({
            "success": false,
            "code": self.kind.code(),
            "timestamp": Utc::now().to_rfc3339(),
            "errors": errors,
        });
        if stack_exposure() {
            body["stack"] = Value::String(self.stack);
        }

        (status, Json(body)).into_response()
    }
}

/// Convenience alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Maps errors escaping the tower layer stack (timeouts, oversized bodies)
/// into the same envelope as everything else.
pub async fn handle_global_error(err: BoxError) -> ApiError {
    if find_cause::<LengthLimitError>(&*err).is_some() {
        return ApiError::bad_request("Request body too large.")
            .with_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    if err.is::<Elapsed>() {
        return ApiError::internal("Request timed out.").with_status(StatusCode::REQUEST_TIMEOUT);
    }

    ApiError::internal(format!("Unhandled internal error: {}", err))
}

/// Walks an error's source chain looking for a specific cause.
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}

/// Fallback for unmatched routes, carrying the original request path.
pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Not Found - {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn kinds_map_to_their_wire_codes() {
        assert_eq!(ErrorKind::Validation.code(), "VALIDATION");
        assert_eq!(ErrorKind::NotFound.code(), "NOT_FOUND");
        assert_eq!(ErrorKind::RateLimit.code(), "RATE_LIMIT");
        assert_eq!(ErrorKind::DatabaseError.code(), "DATABASE_ERROR");
        assert_eq!(ErrorKind::EmptyCart.code(), "EMPTY_CART");
    }

    #[test]
    fn kinds_map_to_their_status_codes() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ErrorKind::Authentication.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Authorization.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::RateLimit.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorKind::EmptyCart.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn status_override_replaces_the_kind_default() {
        let err: ApiError =
            ApiError::internal("Request timed out.").with_status(StatusCode::REQUEST_TIMEOUT);
        assert_eq!(err.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn unclassified_errors_answer_500_with_the_message_in_the_envelope() {
        let response: Response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL");
        assert_eq!(body["errors"][0]["message"], "boom");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn validation_errors_carry_ordered_issue_details() {
        let issues: Vec<ValidationIssue> = vec![
            ValidationIssue::root("custom", "A"),
            ValidationIssue::at(vec!["x".into(), "y".into()], "custom", "B"),
        ];
        let err: ApiError = ApiError::validation(issues);
        assert_eq!(err.message, "A; x.y B");

        let response: Response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION");
        assert_eq!(body["errors"][0]["message"], "A");
        assert_eq!(body["errors"][1]["message"], "B");
        assert_eq!(body["errors"][1]["path"], json!(["x", "y"]));
    }

    #[tokio::test]
    async fn timeouts_map_to_408_through_the_layer_chokepoint() {
        let err: BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let mapped: ApiError = handle_global_error(err).await;
        assert_eq!(mapped.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(mapped.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn unknown_layer_errors_map_to_500() {
        let err: BoxError = "something broke".into();
        let mapped: ApiError = handle_global_error(err).await;
        assert_eq!(mapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn fallback_carries_the_request_path() {
        let err: ApiError = not_found_handler(Uri::from_static("/does-not-exist")).await;
        assert_eq!(err.message, "Not Found - /does-not-exist");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
