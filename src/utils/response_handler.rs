// Success envelope builder, the single-write response guard and the
// envelope-logging middleware.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::{json, ser::PrettyFormatter, Serializer, Value};
use tracing::{error, info};

use crate::utils::error_handler::ApiError;

/// Builder for the canonical success envelope `{success, data, meta?}`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status_code: StatusCode,
    pub data: Value,
    pub meta: Option<Value>,
}

impl ApiResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            data: Value::Null,
            meta: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::new(StatusCode::CREATED)
    }

    /// Sets the data payload.
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Sets the optional meta payload. The key is omitted from the envelope
    /// when no meta was set.
    pub fn meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut body: Value = json!({
            "success": true,
            "data": self.data,
        });
        if let Some(meta) = self.meta {
            body["meta"] = meta;
        }

        let mut response: Response = Json(body).into_response();
        *response.status_mut() = self.status_code;
        response
    }
}

/// Single-write guard for terminal response construction.
///
/// Exactly one of the success/error paths may write a response per request;
/// a second send on the same sink is a bug and is reported as one.
#[derive(Debug, Default)]
pub struct ResponseSink {
    sent: bool,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self { sent: false }
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Sends a prebuilt response through the sink.
    pub fn send(&mut self, response: Response) -> Result<Response, ApiError> {
        if self.sent {
            return Err(ApiError::internal("Response already sent."));
        }
        self.sent = true;
        Ok(response)
    }

    /// Builds and sends the success envelope.
    pub fn send_success(
        &mut self,
        status_code: StatusCode,
        data: Value,
        meta: Option<Value>,
    ) -> Result<Response, ApiError> {
        let mut response: ApiResponse = ApiResponse::new(status_code).data(data);
        if let Some(meta) = meta {
            response = response.meta(meta);
        }
        self.send(response.into_response())
    }

    /// Builds and sends the error envelope.
    pub fn send_error(&mut self, error: ApiError) -> Result<Response, ApiError> {
        self.send(error.into_response())
    }
}

/// Converts any `Serialize` type into a two-space-indented JSON string.
fn to_two_space_indented_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut writer: Vec<u8> = Vec::new();
    let formatter: PrettyFormatter<'_> = PrettyFormatter::with_indent(b"  ");
    let mut ser: Serializer<&mut Vec<u8>, PrettyFormatter<'_>> =
        Serializer::with_formatter(&mut writer, formatter);

    value.serialize(&mut ser)?;

    Ok(String::from_utf8_lossy(&writer).into_owned())
}

fn log_envelope(method: &Method, path: &str, status: StatusCode, envelope: &Value) {
    match to_two_space_indented_json(envelope) {
        Ok(spaced_json) => {
            info!("{} {} -> {}\n{}", method, path, status.as_u16(), spaced_json);
        }
        Err(err) => error!("Failed to format response JSON: {:?}", err),
    }
}

/// Middleware that buffers the outgoing envelope, logs it pretty-printed and
/// rebuilds the response through a [`ResponseSink`].
pub async fn response_logger(req: Request, next: Next) -> Result<Response, ApiError> {
    let method: Method = req.method().clone();
    let path: String = req.uri().path().to_string();

    let response: Response = next.run(req).await;
    let (parts, body) = response.into_parts();

    let bytes: Bytes = body
        .collect()
        .await
        .map_err(|err| ApiError::internal(format!("Failed to buffer response body: {}", err)))?
        .to_bytes();

    if let Ok(envelope) = serde_json::from_slice::<Value>(&bytes) {
        log_envelope(&method, &path, parts.status, &envelope);
    }

    let mut sink: ResponseSink = ResponseSink::new();
    sink.send(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope_omits_meta_when_absent() {
        let response: Response = ApiResponse::ok().data(json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], json!({"id": 1}));
        assert!(body.get("meta").is_none());
    }

    #[tokio::test]
    async fn success_envelope_includes_meta_when_set() {
        let response: Response = ApiResponse::created()
            .data(json!([1, 2, 3]))
            .meta(json!({"total": 3}))
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = body_json(response).await;
        assert_eq!(body["meta"], json!({"total": 3}));
    }

    #[test]
    fn second_send_on_the_same_sink_is_an_error() {
        let mut sink: ResponseSink = ResponseSink::new();

        let first = sink.send_success(StatusCode::OK, json!({"ok": true}), None);
        assert!(first.is_ok());
        assert!(sink.is_sent());

        let second = sink.send_success(StatusCode::OK, json!({"ok": true}), None);
        let err: ApiError = second.unwrap_err();
        assert_eq!(err.message, "Response already sent.");
    }

    #[test]
    fn error_send_after_success_send_is_also_rejected() {
        let mut sink: ResponseSink = ResponseSink::new();

        sink.send_success(StatusCode::OK, Value::Null, None).unwrap();
        let result = sink.send_error(ApiError::internal("late failure"));
        assert!(result.is_err());
    }
}
