//! Shared utilities for tickerlens
//!
//! This crate provides common functionality used across the tickerlens workspace:
//! tracing setup and resolution of secrets (API keys) from a secrets file or the
//! process environment.

pub mod logging;
pub mod secrets;

pub use logging::{DEFAULT_FILTER, init_tracing, init_tracing_with};
pub use secrets::{SecretStore, SecretsError};
