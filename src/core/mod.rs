// Core application infrastructure: logging and server setup.

pub mod logging;
pub mod server;
