//! # Catalog Domain
//!
//! Product search with combo pricing recommendations:
//!
//! - **[`models`]**: products, discounts, combos and pagination types
//! - **[`pricing`]**: the combo scoring and recommendation engine
//! - **[`repository`]**: repository traits plus an in-memory implementation
//! - **[`postgres`]**: PostgreSQL repository
//! - **[`cache`]**: search result cache over Redis
//! - **[`service`]**: the search orchestrator
//! - **[`handlers`]**: HTTP endpoints

pub mod cache;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod pricing;
pub mod repository;
pub mod service;

pub use cache::{CacheService, InMemoryCache, RedisCache};
pub use error::{CatalogError, CatalogResult};
pub use models::{Combo, ComboProduct, Discount, Product, SearchOptions};
pub use postgres::PgCatalogRepository;
pub use pricing::{DiscountResolver, PricingConfig, PricingEngine, ProductPricing};
pub use repository::{ComboRepository, InMemoryCatalogRepository, ProductRepository};
pub use service::{SearchResult, SearchService};
