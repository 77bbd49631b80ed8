// Environment configuration with warned defaults.

use std::{borrow::Cow, collections::HashMap};

use anyhow::{Context, Result};
use tracing::warn;

// Default values used when the variables aren't set:
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 3; // 3 seconds

/// All environment variables used by the app.
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub protocol: Cow<'static, str>,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    /// Whether error envelopes include the captured backtrace. Defaults to
    /// on outside production.
    pub expose_stack_traces: bool,
    pub bcrypt_cost: u32,
}

impl EnvironmentVariables {
    /// Loads environment variables once. Only reads .env if
    /// ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        // Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars().chain(dotenv::vars()).collect();

        let get_var = |key: &str| vars.get(key).map(String::as_str);

        let environment: Cow<'static, str> = get_var("ENVIRONMENT")
            .map(|s| Cow::Owned(s.into()))
            .unwrap_or_else(|| {
                warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                Cow::Borrowed(DEFAULT_ENVIRONMENT)
            });

        let expose_stack_traces: bool = get_var("EXPOSE_STACK_TRACES")
            .map(|s| s.parse().context("Invalid EXPOSE_STACK_TRACES value"))
            .transpose()?
            .unwrap_or(environment != "production");

        Ok(Self {
            environment,

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            protocol: get_var("PROTOCOL")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_PROTOCOL)),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            expose_stack_traces,

            bcrypt_cost: get_var("BCRYPT_COST")
                .map(|s| s.parse().context("Invalid BCRYPT_COST"))
                .transpose()?
                .unwrap_or(bcrypt::DEFAULT_COST),
        })
    }
}
