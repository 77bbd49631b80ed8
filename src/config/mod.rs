// Configuration: environment variables and application state.

pub mod environment;
pub mod state;

pub use environment::EnvironmentVariables;
pub use state::AppState;
