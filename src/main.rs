use axum::serve;

use storefront_api::config::state::AppState;
use storefront_api::core::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // set up logging
    logging::init_tracing();

    let state: AppState = AppState::from_env()?;

    // background purge of expired cache entries
    state.cache.spawn_sweeper();

    let listener: tokio::net::TcpListener = server::setup_listener(&state).await?;
    tracing::info!("Server listening on: {}", listener.local_addr()?);

    let app: axum::Router = server::create_app(state.clone());

    // connect info gives rate limiting a per-client peer address
    serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal(state))
    .await?;

    Ok(())
}
