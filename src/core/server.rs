// Application server configuration and setup

use std::time::Duration;

use anyhow::Result;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    Router,
};
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tower::{timeout::TimeoutLayer, ServiceBuilder};

use crate::api::auth::routes::auth_routes;
use crate::api::orders::routes::order_routes;
use crate::api::products::routes::product_routes;
use crate::api::reviews::routes::review_routes;
use crate::api::uploads::routes::upload_routes;
use crate::config::state::AppState;
use crate::utils::error_handler::{handle_global_error, not_found_handler};
use crate::utils::response_handler::response_logger;

/// Creates and configures the application router with all middleware layers
pub fn create_app(state: AppState) -> Router {
    let env: &std::sync::Arc<crate::config::environment::EnvironmentVariables> = &state.env;

    Router::new()
        .merge(auth_routes(state.clone()))
        .merge(product_routes(state.clone()))
        .merge(order_routes(state.clone()))
        .merge(review_routes(state.clone()))
        .merge(upload_routes(state.clone()))
        // Add new routes here
        .fallback(not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(response_logger))
                .layer(HandleErrorLayer::new(handle_global_error))
                .layer(TimeoutLayer::new(Duration::from_secs(env.default_timeout_seconds)))
                .layer(DefaultBodyLimit::max(env.max_request_body_size)),
        )
        .with_state(state)
}

/// Sets up the TCP listener from environment or binds to new address
pub async fn setup_listener(state: &AppState) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => {
            let addr: String = format!("{}:{}", state.env.host, state.env.port);
            TcpListener::bind(&addr).await?
        }
    };

    Ok(listener)
}

/// Handles graceful shutdown signals (Ctrl+C and TERM)
pub async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Terminate signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate: std::future::Pending<()> = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutting down via Ctrl+C"),
        _ = terminate => tracing::info!("Shutting down via TERM signal"),
    }

    state.cache.shutdown();
}
