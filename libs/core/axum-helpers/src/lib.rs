//! # Axum Helpers
//!
//! Shared utilities for building Axum web applications:
//!
//! - **[`errors`]**: structured error responses ([`AppError`], [`ErrorResponse`])
//! - **[`extractors`]**: query-string extractor with automatic validation
//! - **[`shutdown`]**: graceful shutdown signal handling

pub mod errors;
pub mod extractors;
pub mod shutdown;

pub use errors::{AppError, ErrorResponse};
pub use extractors::ValidatedQuery;
pub use shutdown::shutdown_signal;
