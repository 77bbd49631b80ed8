// Error handling and response envelope utilities.

pub mod error_handler;
pub mod response_handler;

pub use error_handler::{ApiError, ApiResult, ErrorKind};
pub use response_handler::{ApiResponse, ResponseSink};
