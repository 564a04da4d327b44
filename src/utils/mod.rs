//! Utility modules for common functionality.
//!
//! - http: Retryable HTTP client construction
//! - logging: Logging setup and the shared error context
//! - tests: Builders for test fixtures

pub mod http;
pub mod logging;
pub mod tests;
