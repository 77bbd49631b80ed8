// API surface: feature routers, handlers and request middleware.

pub mod auth;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
