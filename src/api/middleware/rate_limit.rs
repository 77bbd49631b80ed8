// Tiered fixed-window rate limiting backed by the cache's rate-limit
// namespace.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::cache::CacheNamespace;
use crate::config::state::AppState;
use crate::utils::error_handler::ApiError;

/// Rate limit tiers. Each route group picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitTier {
    Default,
    Strict,
    Admin,
    Auth,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u64,
    pub message: &'static str,
}

const WINDOW_15_MIN: Duration = Duration::from_secs(15 * 60);

impl RateLimitTier {
    pub fn config(self) -> RateLimitConfig {
        match self {
            RateLimitTier::Default => RateLimitConfig {
                window: WINDOW_15_MIN,
                max_requests: 100,
                message: "Too many requests, please try again later.",
            },
            RateLimitTier::Strict => RateLimitConfig {
                window: WINDOW_15_MIN,
                max_requests: 20,
                message: "Too many requests for this operation, please try again later.",
            },
            RateLimitTier::Admin => RateLimitConfig {
                window: WINDOW_15_MIN,
                max_requests: 300,
                message: "Too many admin requests, please try again later.",
            },
            RateLimitTier::Auth => RateLimitConfig {
                window: WINDOW_15_MIN,
                max_requests: 10,
                message: "Too many authentication attempts, please try again later.",
            },
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            RateLimitTier::Default => "default",
            RateLimitTier::Strict => "strict",
            RateLimitTier::Admin => "admin",
            RateLimitTier::Auth => "auth",
        }
    }
}

/// Client identity for the counter key: proxy headers first, then the peer
/// address. Direct clients must not share a bucket.
fn client_key(request: &Request) -> String {
    let headers = request.headers();
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|value| value.to_str().ok())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware enforcing the tier's fixed-window counter per client.
pub async fn rate_limit(
    State((state, tier)): State<(AppState, RateLimitTier)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let config: RateLimitConfig = tier.config();
    let key: String = format!("{}:{}", tier.as_str(), client_key(&request));

    let count: u64 = state
        .cache
        .incr(CacheNamespace::RateLimit, &key, config.window)
        .await;

    if count > config.max_requests {
        return Err(ApiError::rate_limit(config.message));
    }

    Ok(next.run(request).await)
}
