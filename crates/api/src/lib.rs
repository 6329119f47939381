//! HTTP API layer for sweater.
//!
//! - **Endpoints**: sign-up, activation, profile, user channels, messages
//! - **Extractors**: authenticated account
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
