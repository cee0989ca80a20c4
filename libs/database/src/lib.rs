//! Database connectors shared across services.
//!
//! - [`postgres`]: sqlx connection pool setup
//! - [`redis`]: Redis `ConnectionManager` setup
//! - [`common`]: retry with exponential backoff for connection bootstrap

pub mod common;
pub mod postgres;
pub mod redis;
