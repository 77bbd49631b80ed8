// Request middleware: authentication, admin gating and rate limiting.

pub mod auth;
pub mod rate_limit;
