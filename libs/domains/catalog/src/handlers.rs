use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use axum_helpers::ValidatedQuery;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::cache::CacheService;
use crate::error::CatalogError;
use crate::models::{ComboProduct, Pagination, Product, SearchOptions};
use crate::pricing::{
    DiscountResolver, IndividualPrice, ProductPricing, RecommendedCombo, RecommendedOption,
};
use crate::repository::{ComboRepository, ProductRepository};
use crate::service::{SearchResult, SearchService};

#[derive(OpenApi)]
#[openapi(
    paths(search_products, get_product, get_product_by_code),
    components(schemas(
        SearchResponse,
        QueryEcho,
        ProductView,
        PricingView,
        ComboView,
        Product,
        Pagination,
        IndividualPrice,
        RecommendedCombo,
        RecommendedOption,
        ComboProduct,
    )),
    tags((name = "catalog", description = "Product search API"))
)]
pub struct ApiDoc;

/// Query parameters accepted by the search endpoint.
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct SearchParams {
    /// Search term matched against name, code and description.
    #[validate(length(min = 1, max = 100, message = "q must be 1-100 characters"))]
    pub q: String,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: i64,

    #[serde(default = "crate::models::default_true")]
    pub include_combos: bool,
}

fn default_limit() -> i64 {
    20
}

/// Search response envelope: the result page plus an echo of the query.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub data: Vec<ProductView>,
    pub pagination: Pagination,
    pub query: QueryEcho,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryEcho {
    pub term: String,
    pub include_combos: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: String,
    pub category: Option<String>,
    pub base_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingView {
    pub individual: IndividualPrice,
    pub recommended_option: RecommendedOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_combo: Option<RecommendedCombo>,
    pub available_combos: Vec<ComboView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComboView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub savings: f64,
    pub savings_percentage: String,
    pub products: Vec<ComboProduct>,
}

impl From<ProductPricing> for PricingView {
    fn from(pricing: ProductPricing) -> Self {
        Self {
            individual: pricing.individual_price,
            recommended_option: pricing.recommended_option,
            recommended_combo: pricing.recommended_combo,
            available_combos: pricing
                .available_combos
                .into_iter()
                .map(|combo| ComboView {
                    id: combo.id,
                    name: combo.name,
                    description: combo.description,
                    price: combo.combo_price,
                    savings: combo.savings,
                    savings_percentage: combo.savings_percentage,
                    products: combo.products,
                })
                .collect(),
        }
    }
}

impl SearchResponse {
    fn from_result(result: SearchResult, term: String, include_combos: bool) -> Self {
        Self {
            data: result
                .data
                .into_iter()
                .map(|item| ProductView {
                    id: item.product.id,
                    name: item.product.name,
                    code: item.product.code,
                    description: item.product.description,
                    category: item.product.category,
                    base_price: item.product.base_price,
                    pricing: item.pricing.map(PricingView::from),
                })
                .collect(),
            pagination: result.pagination,
            query: QueryEcho {
                term,
                include_combos,
            },
        }
    }
}

/// Build the catalog router. Routes are relative; the application nests them
/// under its API prefix.
pub fn router<P, C, D, K>(service: SearchService<P, C, D, K>) -> Router
where
    P: ProductRepository + 'static,
    C: ComboRepository + 'static,
    D: DiscountResolver + 'static,
    K: CacheService + 'static,
{
    Router::new()
        .route("/search", get(search_products))
        .route("/code/{code}", get(get_product_by_code))
        .route("/{id}", get(get_product))
        .with_state(Arc::new(service))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Search results with pricing", body = SearchResponse),
        (status = 400, description = "Invalid query parameters"),
    ),
    tag = "catalog"
)]
async fn search_products<P, C, D, K>(
    State(service): State<Arc<SearchService<P, C, D, K>>>,
    ValidatedQuery(params): ValidatedQuery<SearchParams>,
) -> Result<Json<SearchResponse>, CatalogError>
where
    P: ProductRepository + 'static,
    C: ComboRepository + 'static,
    D: DiscountResolver + 'static,
    K: CacheService + 'static,
{
    let options = SearchOptions {
        limit: params.limit,
        offset: params.offset,
        include_combos: params.include_combos,
    };
    let result = service.execute(&params.q, options).await?;
    let term = params.q.trim().to_string();
    Ok(Json(SearchResponse::from_result(
        result,
        term,
        params.include_combos,
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, description = "Invalid product id"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
async fn get_product<P, C, D, K>(
    State(service): State<Arc<SearchService<P, C, D, K>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, CatalogError>
where
    P: ProductRepository + 'static,
    C: ComboRepository + 'static,
    D: DiscountResolver + 'static,
    K: CacheService + 'static,
{
    let id: Uuid = id
        .parse()
        .map_err(|_| CatalogError::Validation(format!("Invalid product id '{id}'")))?;
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/products/code/{code}",
    params(("code" = String, Path, description = "Product catalog code")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
async fn get_product_by_code<P, C, D, K>(
    State(service): State<Arc<SearchService<P, C, D, K>>>,
    Path(code): Path<String>,
) -> Result<Json<Product>, CatalogError>
where
    P: ProductRepository + 'static,
    C: ComboRepository + 'static,
    D: DiscountResolver + 'static,
    K: CacheService + 'static,
{
    let product = service.get_product_by_code(&code).await?;
    Ok(Json(product))
}
