// Library root for the storefront REST API.

pub mod api;
pub mod cache;
pub mod config;
pub mod core;
pub mod utils;
pub mod validation;

pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::state::AppState;
pub use crate::utils::error_handler::{ApiError, ApiResult, ErrorKind};
pub use crate::utils::response_handler::ApiResponse;
