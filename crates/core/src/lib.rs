//! Core business logic for sweater.

pub mod services;

pub use services::*;
