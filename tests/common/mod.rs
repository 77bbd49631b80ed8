//! Shared test helpers: spawn the app on an ephemeral port and seed state.

#![allow(dead_code)]

use std::borrow::Cow;

use axum::serve;
use serde_json::{json, Value};
use tokio::net::TcpListener as TokioTcpListener;

use storefront_api::api::middleware::auth::{session_key, AuthContext};
use storefront_api::cache::CacheNamespace;
use storefront_api::config::{environment::EnvironmentVariables, state::AppState};
use storefront_api::core::server::create_app;
use storefront_api::validation::object_id::ObjectId;

/// Test configuration: low bcrypt cost, no stack traces in envelopes.
pub fn test_environment() -> EnvironmentVariables {
    EnvironmentVariables {
        environment: Cow::Borrowed("test"),
        host: Cow::Borrowed("127.0.0.1"),
        port: 0,
        protocol: Cow::Borrowed("http"),
        max_request_body_size: 2_097_152,
        default_timeout_seconds: 5,
        expose_stack_traces: false,
        bcrypt_cost: 4,
    }
}

/// Spawns the app on a random unused port; returns its base URL and the
/// state, so tests can seed the injected cache directly.
pub fn spawn_app() -> (String, AppState) {
    let state: AppState = AppState::with_environment(test_environment());
    let app: axum::Router = create_app(state.clone());

    let std_listener: std::net::TcpListener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    let tokio_listener: TokioTcpListener =
        TokioTcpListener::from_std(std_listener).expect("Failed to convert to tokio listener");
    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    tokio::spawn(async move {
        serve(
            tokio_listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    (format!("http://{}", addr), state)
}

/// Seeds a live admin session straight into the cache and returns its token.
pub async fn seed_admin_session(state: &AppState) -> String {
    let token: String = "admin-test-token".to_string();
    let context: AuthContext = AuthContext {
        user_id: ObjectId::new(),
        email: "admin@example.com".to_string(),
        is_admin: true,
    };

    state
        .cache
        .set(
            CacheNamespace::User,
            &session_key(&token),
            serde_json::to_value(&context).unwrap(),
            None,
        )
        .await
        .unwrap();

    token
}

/// Registers and logs in a fresh user over HTTP; returns the session token.
pub async fn register_and_login(base_url: &str, email: &str, password: &str) -> String {
    let client: reqwest::Client = reqwest::Client::new();

    let resp: reqwest::Response = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("register failed");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    let resp: reqwest::Response = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}
