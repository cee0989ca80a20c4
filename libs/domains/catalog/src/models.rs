use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a catalog product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

/// How a discount value is interpreted against a price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
}

/// A sellable catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub stock_quantity: i32,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    pub fn has_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Price after applying `discount`, if it is valid at `at`.
    ///
    /// An expired, not-yet-started, or inactive discount leaves the base
    /// price untouched. The result never drops below zero.
    pub fn apply_discount(&self, discount: Option<&Discount>, at: DateTime<Utc>) -> f64 {
        match discount {
            Some(d) if d.is_valid_at(at) => {
                let discounted = match d.discount_type {
                    DiscountType::Percentage => self.base_price * (1.0 - d.value / 100.0),
                    DiscountType::Fixed => self.base_price - d.value,
                };
                discounted.max(0.0)
            }
            _ => self.base_price,
        }
    }
}

/// A discount attached to a product.
///
/// Either validity bound may be absent, in which case the discount is
/// open-ended on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: f64,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Discount {
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.valid_from.is_some_and(|from| at < from) {
            return false;
        }
        if self.valid_until.is_some_and(|until| at > until) {
            return false;
        }
        true
    }
}

/// A product line inside a combo, with the quantity the combo requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComboProduct {
    pub name: String,
    pub base_price: f64,
    pub quantity: i32,
    #[serde(default = "default_true")]
    pub is_mandatory: bool,
}

/// A bundle of products sold together at a single combo price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Combo {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub combo_price: f64,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    /// Merchandising priority; unset combos rank with a neutral popularity.
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub products: Vec<ComboProduct>,
}

impl Combo {
    /// Sum of the component base prices, weighted by required quantity.
    pub fn total_price(&self) -> f64 {
        self.products
            .iter()
            .map(|p| p.base_price * f64::from(p.quantity))
            .sum()
    }

    /// Amount saved by buying the combo instead of the parts. Never negative,
    /// even for combos priced above their component total.
    pub fn savings(&self) -> f64 {
        (self.total_price() - self.combo_price).max(0.0)
    }

    /// Savings as a percentage of the component total, formatted with two
    /// decimal places. `"0.00"` when the combo has no priced components.
    pub fn savings_percentage(&self) -> String {
        let total = self.total_price();
        if total == 0.0 {
            return "0.00".to_string();
        }
        format!("{:.2}", self.savings() / total * 100.0)
    }

    /// A combo is sellable when it is active and bundles at least one product.
    pub fn is_valid(&self) -> bool {
        self.is_active && !self.products.is_empty()
    }
}

/// Offset pagination metadata for a result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_next: bool,
}

/// One page of products from the repository, before pricing enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub data: Vec<Product>,
    pub pagination: Pagination,
}

/// Options controlling a product search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub limit: i64,
    pub offset: i64,
    pub include_combos: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            include_combos: true,
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}
