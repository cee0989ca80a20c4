use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::models::{Combo, Discount, Pagination, Product, ProductPage};
use crate::pricing::DiscountResolver;

/// Product lookup operations backing the search service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Case-insensitive substring search over name, code and description of
    /// active products, ordered by name.
    async fn search(&self, query: &str, limit: i64, offset: i64) -> CatalogResult<ProductPage>;

    async fn find_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>>;

    async fn find_by_code(&self, code: &str) -> CatalogResult<Option<Product>>;
}

/// Combo lookup operations backing the pricing fan-out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComboRepository: Send + Sync {
    /// Active combos containing the product, ordered by priority (unset
    /// priorities last), then name.
    async fn find_by_product_id(&self, product_id: Uuid) -> CatalogResult<Vec<Combo>>;
}

/// In-memory catalog store for tests and examples.
///
/// Implements all three repository traits so a single instance can back the
/// whole service.
#[derive(Default, Clone)]
pub struct InMemoryCatalogRepository {
    products: Arc<RwLock<Vec<Product>>>,
    combos: Arc<RwLock<HashMap<Uuid, Vec<Combo>>>>,
    discounts: Arc<RwLock<HashMap<Uuid, Discount>>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.push(product);
    }

    pub async fn insert_combo(&self, product_id: Uuid, combo: Combo) {
        self.combos
            .write()
            .await
            .entry(product_id)
            .or_default()
            .push(combo);
    }

    pub async fn insert_discount(&self, product_id: Uuid, discount: Discount) {
        self.discounts.write().await.insert(product_id, discount);
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalogRepository {
    async fn search(&self, query: &str, limit: i64, offset: i64) -> CatalogResult<ProductPage> {
        let needle = query.to_lowercase();
        let products = self.products.read().await;

        let mut matches: Vec<Product> = products
            .iter()
            .filter(|p| p.is_active())
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.code.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let total = matches.len() as i64;
        let data: Vec<Product> = matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok(ProductPage {
            data,
            pagination: Pagination {
                total,
                limit,
                offset,
                has_next: offset + limit < total,
            },
        })
    }

    async fn find_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id && p.is_active()).cloned())
    }

    async fn find_by_code(&self, code: &str) -> CatalogResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .find(|p| p.code == code && p.is_active())
            .cloned())
    }
}

#[async_trait]
impl ComboRepository for InMemoryCatalogRepository {
    async fn find_by_product_id(&self, product_id: Uuid) -> CatalogResult<Vec<Combo>> {
        let combos = self.combos.read().await;
        let mut found: Vec<Combo> = combos
            .get(&product_id)
            .map(|list| list.iter().filter(|c| c.is_active).cloned().collect())
            .unwrap_or_default();
        found.sort_by(|a, b| match (a.priority, b.priority) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
        Ok(found)
    }
}

#[async_trait]
impl DiscountResolver for InMemoryCatalogRepository {
    async fn active_discount(&self, product_id: Uuid) -> CatalogResult<Option<Discount>> {
        let discounts = self.discounts.read().await;
        Ok(discounts.get(&product_id).filter(|d| d.is_active).cloned())
    }
}
