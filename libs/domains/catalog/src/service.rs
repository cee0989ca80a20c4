//! Product search orchestration: cache lookup, repository search, pricing
//! fan-out, cache write-back.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::CacheService;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Pagination, Product, SearchOptions};
use crate::pricing::{DiscountResolver, PricingEngine, ProductPricing};
use crate::repository::{ComboRepository, ProductRepository};

/// A product together with its pricing verdict. Pricing is absent when the
/// caller opted out of combo enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductWithPricing {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ProductPricing>,
}

/// One page of enriched search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub data: Vec<ProductWithPricing>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone)]
pub struct SearchServiceConfig {
    pub cache_ttl_seconds: u64,
    /// Cap on each per-product combo lookup during enrichment.
    pub combo_fetch_timeout: Duration,
}

impl Default for SearchServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 900,
            combo_fetch_timeout: Duration::from_secs(5),
        }
    }
}

/// Orchestrates a product search end to end.
///
/// Cache and combo failures degrade gracefully: a broken cache falls back to
/// recomputation, and a failed combo lookup prices that product individually.
/// Only the primary product search propagates errors to the caller.
pub struct SearchService<P, C, D, K>
where
    P: ProductRepository,
    C: ComboRepository,
    D: DiscountResolver,
    K: CacheService,
{
    products: Arc<P>,
    combos: Arc<C>,
    engine: Arc<PricingEngine<D>>,
    cache: Arc<K>,
    config: SearchServiceConfig,
}

impl<P, C, D, K> Clone for SearchService<P, C, D, K>
where
    P: ProductRepository,
    C: ComboRepository,
    D: DiscountResolver,
    K: CacheService,
{
    fn clone(&self) -> Self {
        Self {
            products: Arc::clone(&self.products),
            combos: Arc::clone(&self.combos),
            engine: Arc::clone(&self.engine),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

impl<P, C, D, K> SearchService<P, C, D, K>
where
    P: ProductRepository,
    C: ComboRepository,
    D: DiscountResolver,
    K: CacheService,
{
    pub fn new(products: P, combos: C, engine: PricingEngine<D>, cache: K) -> Self {
        Self {
            products: Arc::new(products),
            combos: Arc::new(combos),
            engine: Arc::new(engine),
            cache: Arc::new(cache),
            config: SearchServiceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Run a search and enrich each hit with combo pricing.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn execute(&self, query: &str, options: SearchOptions) -> CatalogResult<SearchResult> {
        let query = query.trim();
        let SearchOptions {
            limit,
            offset,
            include_combos,
        } = options;

        let cache_key = format!("search:{query}:{limit}:{offset}:{include_combos}");
        if let Some(cached) = self.cache_get(&cache_key).await {
            match serde_json::from_str::<SearchResult>(&cached) {
                Ok(result) => {
                    debug!(key = %cache_key, "search cache hit");
                    return Ok(result);
                }
                Err(e) => warn!(key = %cache_key, "discarding unreadable cache entry: {e}"),
            }
        }

        let page = self.products.search(query, limit, offset).await?;
        let data = if include_combos {
            join_all(page.data.into_iter().map(|p| self.enrich(p))).await
        } else {
            page.data
                .into_iter()
                .map(|product| ProductWithPricing {
                    product,
                    pricing: None,
                })
                .collect()
        };

        let result = SearchResult {
            data,
            pagination: page.pagination,
        };
        self.cache_set(&cache_key, &result).await;
        Ok(result)
    }

    /// Fetch a single active product by id.
    pub async fn get_product(&self, id: Uuid) -> CatalogResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Product {id} not found")))
    }

    /// Fetch a single active product by its catalog code.
    pub async fn get_product_by_code(&self, code: &str) -> CatalogResult<Product> {
        self.products
            .find_by_code(code)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Product with code '{code}' not found")))
    }

    async fn enrich(&self, product: Product) -> ProductWithPricing {
        let combos = match timeout(
            self.config.combo_fetch_timeout,
            self.combos.find_by_product_id(product.id),
        )
        .await
        {
            Ok(Ok(combos)) => combos,
            Ok(Err(e)) => {
                warn!(product_id = %product.id, "combo lookup failed, pricing individually: {e}");
                Vec::new()
            }
            Err(_) => {
                warn!(product_id = %product.id, "combo lookup timed out, pricing individually");
                Vec::new()
            }
        };

        let pricing = self.engine.calculate_best_option(&product, &combos).await;
        ProductWithPricing {
            product,
            pricing: Some(pricing),
        }
    }

    async fn cache_get(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, "cache read failed, falling back to repositories: {e}");
                None
            }
        }
    }

    async fn cache_set(&self, key: &str, result: &SearchResult) {
        let payload = match serde_json::to_string(result) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, "failed to serialize search result for caching: {e}");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .set(key, &payload, self.config.cache_ttl_seconds)
            .await
        {
            warn!(key = %key, "cache write failed: {e}");
        }
    }
}
