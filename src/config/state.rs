// Application state: environment plus the injected cache.
//
// The cache is an explicitly constructed resource handed to the router, not
// a module-level singleton, so every test run can build its own instance.

use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::config::environment::EnvironmentVariables;
use crate::utils::error_handler::set_stack_exposure;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Arc<EnvironmentVariables>,
    pub cache: MemoryCache,
}

impl AppState {
    /// Builds state from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let env: EnvironmentVariables = EnvironmentVariables::load()?;
        Ok(Self::with_environment(env))
    }

    /// Builds state from an already-loaded configuration (used by tests).
    pub fn with_environment(env: EnvironmentVariables) -> Self {
        set_stack_exposure(env.expose_stack_traces);

        Self {
            env: Arc::new(env),
            cache: MemoryCache::new(),
        }
    }
}
