//! Combo pricing and recommendation engine.
//!
//! Given a product and the combos it participates in, the engine scores each
//! combo on savings, merchandising priority, stock and margin, then decides
//! whether to recommend buying a combo over the individual product.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::models::{Combo, ComboProduct, Discount, DiscountType, Product};

/// Reason attached to every combo recommendation.
const RECOMMENDATION_REASON: &str = "largest available saving";

/// Relative weight of each scoring dimension. Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub savings: f64,
    pub popularity: f64,
    pub stock: f64,
    pub margin: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            savings: 0.4,
            popularity: 0.3,
            stock: 0.2,
            margin: 0.1,
        }
    }
}

/// Tunable parameters for the pricing engine.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub weights: ScoringWeights,
    /// Popularity used for combos with no merchandising priority set.
    pub default_popularity: f64,
    /// Flat stock score until inventory signals are wired in.
    pub stock_score: f64,
    /// Flat margin score until cost data is wired in.
    pub margin_score: f64,
    /// Savings are scaled down by this divisor before weighting.
    pub savings_divisor: f64,
    /// Ceiling of the scaled savings score.
    pub savings_score_cap: f64,
    /// Minimum absolute savings before a combo is recommended.
    pub recommendation_threshold: f64,
    /// How many combos are listed in a pricing result.
    pub max_listed_combos: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            default_popularity: 5.0,
            stock_score: 8.0,
            margin_score: 6.0,
            savings_divisor: 10.0,
            savings_score_cap: 10.0,
            recommendation_threshold: 5.0,
            max_listed_combos: 5,
        }
    }
}

/// Resolves the discount currently applicable to a product, if any.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscountResolver: Send + Sync {
    async fn active_discount(&self, product_id: Uuid) -> CatalogResult<Option<Discount>>;
}

/// The discount applied to an individual price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: f64,
    pub amount: f64,
}

/// Individual purchase price of a product after discount resolution. When no
/// discount resolves, `discount` carries a zero value and amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndividualPrice {
    pub original_price: f64,
    pub discount: AppliedDiscount,
    pub final_price: f64,
}

/// A scored combo, ready to be ranked and presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComboAnalysis {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub combo_price: f64,
    pub savings: f64,
    pub savings_percentage: String,
    pub products: Vec<ComboProduct>,
    pub score: f64,
}

/// The single combo the engine suggests buying instead of the product alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedCombo {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub savings: f64,
    pub reason: String,
}

/// What the engine recommends the shopper do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecommendedOption {
    Individual,
    Combo,
}

/// Full pricing verdict for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPricing {
    pub individual_price: IndividualPrice,
    pub recommended_option: RecommendedOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_combo: Option<RecommendedCombo>,
    pub available_combos: Vec<ComboAnalysis>,
}

/// Scores combos and picks the best purchase option for a product.
///
/// The engine is total: discount resolution failures degrade to the
/// undiscounted price instead of failing the whole pricing call.
pub struct PricingEngine<D: DiscountResolver> {
    discounts: Arc<D>,
    config: PricingConfig,
}

impl<D: DiscountResolver> PricingEngine<D> {
    pub fn new(discounts: D) -> Self {
        Self {
            discounts: Arc::new(discounts),
            config: PricingConfig::default(),
        }
    }

    pub fn with_config(discounts: D, config: PricingConfig) -> Self {
        Self {
            discounts: Arc::new(discounts),
            config,
        }
    }

    /// Compute the full pricing verdict for `product` given the combos it
    /// appears in. Inactive and empty combos are ignored.
    pub async fn calculate_best_option(
        &self,
        product: &Product,
        combos: &[Combo],
    ) -> ProductPricing {
        let individual_price = self.individual_price(product).await;

        let mut analyses: Vec<ComboAnalysis> = combos
            .iter()
            .filter(|c| c.is_valid())
            .map(|c| self.analyze(c))
            .collect();

        if analyses.is_empty() {
            return ProductPricing {
                individual_price,
                recommended_option: RecommendedOption::Individual,
                recommended_combo: None,
                available_combos: Vec::new(),
            };
        }

        // Stable sort keeps the repository ordering for equal scores.
        analyses.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let best = &analyses[0];
        let recommend = best.savings >= self.config.recommendation_threshold;
        let recommended_combo = recommend.then(|| RecommendedCombo {
            id: best.id,
            name: best.name.clone(),
            price: best.combo_price,
            savings: best.savings,
            reason: RECOMMENDATION_REASON.to_string(),
        });

        analyses.truncate(self.config.max_listed_combos);

        ProductPricing {
            individual_price,
            recommended_option: if recommend {
                RecommendedOption::Combo
            } else {
                RecommendedOption::Individual
            },
            recommended_combo,
            available_combos: analyses,
        }
    }

    /// Individual price with the current discount applied. A resolver failure
    /// degrades to the undiscounted price.
    async fn individual_price(&self, product: &Product) -> IndividualPrice {
        let discount = match self.discounts.active_discount(product.id).await {
            Ok(discount) => discount,
            Err(e) => {
                warn!(
                    product_id = %product.id,
                    "discount lookup failed, pricing without discount: {e}"
                );
                None
            }
        };

        let now = Utc::now();
        let final_price = product.apply_discount(discount.as_ref(), now);
        let applied = discount
            .filter(|d| d.is_valid_at(now))
            .map(|d| AppliedDiscount {
                discount_type: d.discount_type,
                value: d.value,
                amount: product.base_price - final_price,
            })
            .unwrap_or(AppliedDiscount {
                discount_type: DiscountType::default(),
                value: 0.0,
                amount: 0.0,
            });

        IndividualPrice {
            original_price: product.base_price,
            discount: applied,
            final_price,
        }
    }

    fn analyze(&self, combo: &Combo) -> ComboAnalysis {
        let savings = combo.savings();
        ComboAnalysis {
            id: combo.id,
            name: combo.name.clone(),
            description: combo.description.clone(),
            combo_price: combo.combo_price,
            savings,
            savings_percentage: combo.savings_percentage(),
            products: combo.products.clone(),
            score: self.score(combo, savings),
        }
    }

    /// Weighted blend of savings, popularity, stock and margin signals.
    fn score(&self, combo: &Combo, savings: f64) -> f64 {
        let cfg = &self.config;
        let savings_score = (savings / cfg.savings_divisor).min(cfg.savings_score_cap);
        let popularity_score = combo
            .priority
            .map(f64::from)
            .unwrap_or(cfg.default_popularity);

        savings_score * cfg.weights.savings
            + popularity_score * cfg.weights.popularity
            + cfg.stock_score * cfg.weights.stock
            + cfg.margin_score * cfg.weights.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::models::ProductStatus;

    fn product(base_price: f64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Filter Coffee 500g".to_string(),
            code: "FLT-500".to_string(),
            description: String::new(),
            base_price,
            category_id: None,
            category: None,
            status: ProductStatus::Active,
            stock_quantity: 5,
        }
    }

    fn combo(name: &str, combo_price: f64, component_total: f64, priority: Option<i32>) -> Combo {
        Combo {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            combo_price,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            priority,
            is_active: true,
            products: vec![ComboProduct {
                name: "Component".to_string(),
                base_price: component_total,
                quantity: 1,
                is_mandatory: true,
            }],
        }
    }

    fn no_discounts() -> MockDiscountResolver {
        let mut resolver = MockDiscountResolver::new();
        resolver.expect_active_discount().returning(|_| Ok(None));
        resolver
    }

    #[tokio::test]
    async fn test_no_combos_recommends_individual() {
        let engine = PricingEngine::new(no_discounts());
        let pricing = engine.calculate_best_option(&product(20.0), &[]).await;

        assert_eq!(pricing.recommended_option, RecommendedOption::Individual);
        assert!(pricing.recommended_combo.is_none());
        assert!(pricing.available_combos.is_empty());
        assert_eq!(pricing.individual_price.final_price, 20.0);
    }

    #[tokio::test]
    async fn test_savings_above_threshold_recommends_combo() {
        let engine = PricingEngine::new(no_discounts());
        let combos = vec![combo("Big Saver", 45.0, 55.0, None)];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        assert_eq!(pricing.recommended_option, RecommendedOption::Combo);
        let recommended = pricing.recommended_combo.unwrap();
        assert_eq!(recommended.name, "Big Saver");
        assert_eq!(recommended.price, 45.0);
        assert_eq!(recommended.savings, 10.0);
        assert_eq!(recommended.reason, "largest available saving");
    }

    #[tokio::test]
    async fn test_savings_below_threshold_lists_but_does_not_recommend() {
        let engine = PricingEngine::new(no_discounts());
        let combos = vec![combo("Tiny Saver", 51.0, 55.0, None)];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        assert_eq!(pricing.recommended_option, RecommendedOption::Individual);
        assert!(pricing.recommended_combo.is_none());
        assert_eq!(pricing.available_combos.len(), 1);
        assert_eq!(pricing.available_combos[0].savings, 4.0);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let engine = PricingEngine::new(no_discounts());

        // Exactly 5.0 in savings qualifies.
        let at = vec![combo("At", 50.0, 55.0, None)];
        let pricing = engine.calculate_best_option(&product(55.0), &at).await;
        assert_eq!(pricing.recommended_option, RecommendedOption::Combo);

        // A hair under does not.
        let under = vec![combo("Under", 50.01, 55.0, None)];
        let pricing = engine.calculate_best_option(&product(55.0), &under).await;
        assert_eq!(pricing.recommended_option, RecommendedOption::Individual);
    }

    #[tokio::test]
    async fn test_break_even_combo_is_never_recommended() {
        let engine = PricingEngine::new(no_discounts());
        let combos = vec![combo("Break Even", 55.0, 55.0, None)];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        assert_eq!(pricing.recommended_option, RecommendedOption::Individual);
        assert_eq!(pricing.available_combos[0].savings, 0.0);
        assert_eq!(pricing.available_combos[0].savings_percentage, "0.00");
    }

    #[tokio::test]
    async fn test_bundle_scenario_end_to_end() {
        let engine = PricingEngine::new(no_discounts());
        let bundle = Combo {
            id: Uuid::new_v4(),
            name: "Starter Bundle".to_string(),
            description: String::new(),
            combo_price: 90.0,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            priority: None,
            is_active: true,
            products: vec![
                ComboProduct {
                    name: "Main".to_string(),
                    base_price: 60.0,
                    quantity: 1,
                    is_mandatory: true,
                },
                ComboProduct {
                    name: "Side".to_string(),
                    base_price: 50.0,
                    quantity: 1,
                    is_mandatory: false,
                },
            ],
        };

        let pricing = engine
            .calculate_best_option(&product(100.0), &[bundle])
            .await;

        let analysis = &pricing.available_combos[0];
        assert_eq!(analysis.savings, 20.0);
        assert_eq!(analysis.savings_percentage, "18.18");
        assert_eq!(pricing.recommended_option, RecommendedOption::Combo);
        assert_eq!(pricing.recommended_combo.unwrap().savings, 20.0);
    }

    #[tokio::test]
    async fn test_priority_breaks_savings_ties() {
        let engine = PricingEngine::new(no_discounts());
        // Same savings, but "Featured" carries a higher priority.
        let combos = vec![
            combo("Plain", 45.0, 55.0, None),
            combo("Featured", 45.0, 55.0, Some(9)),
        ];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        assert_eq!(pricing.available_combos[0].name, "Featured");
        assert_eq!(pricing.recommended_combo.unwrap().name, "Featured");
    }

    #[tokio::test]
    async fn test_unset_priority_scores_as_neutral_popularity() {
        let engine = PricingEngine::new(no_discounts());
        let combos = vec![
            combo("Demoted", 45.0, 55.0, Some(1)),
            combo("Neutral", 45.0, 55.0, None),
        ];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        // Neutral popularity (5) outranks an explicit priority of 1.
        assert_eq!(pricing.available_combos[0].name, "Neutral");
    }

    #[tokio::test]
    async fn test_savings_score_is_capped() {
        let engine = PricingEngine::new(no_discounts());
        // 200 savings caps at score 10; 150 savings also caps at 10. With
        // equal priority the stable sort keeps input order.
        let combos = vec![
            combo("First", 100.0, 250.0, None),
            combo("Second", 100.0, 300.0, None),
        ];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        assert_eq!(pricing.available_combos[0].name, "First");
        assert_eq!(
            pricing.available_combos[0].score,
            pricing.available_combos[1].score
        );
    }

    #[tokio::test]
    async fn test_listed_combos_are_truncated() {
        let engine = PricingEngine::new(no_discounts());
        let combos: Vec<Combo> = (0..8)
            .map(|i| combo(&format!("Combo {i}"), 45.0, 55.0, None))
            .collect();
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        assert_eq!(pricing.available_combos.len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_combos_are_skipped() {
        let engine = PricingEngine::new(no_discounts());
        let mut inactive = combo("Inactive", 45.0, 55.0, None);
        inactive.is_active = false;
        let mut empty = combo("Empty", 45.0, 55.0, None);
        empty.products.clear();

        let pricing = engine
            .calculate_best_option(&product(55.0), &[inactive, empty])
            .await;

        assert_eq!(pricing.recommended_option, RecommendedOption::Individual);
        assert!(pricing.available_combos.is_empty());
    }

    #[tokio::test]
    async fn test_discount_applied_to_individual_price() {
        let mut resolver = MockDiscountResolver::new();
        resolver.expect_active_discount().returning(|_| {
            Ok(Some(Discount {
                id: Uuid::new_v4(),
                discount_type: DiscountType::Percentage,
                value: 20.0,
                valid_from: None,
                valid_until: None,
                is_active: true,
            }))
        });
        let engine = PricingEngine::new(resolver);
        let pricing = engine.calculate_best_option(&product(50.0), &[]).await;

        assert_eq!(pricing.individual_price.original_price, 50.0);
        assert_eq!(pricing.individual_price.final_price, 40.0);
        assert_eq!(pricing.individual_price.discount.value, 20.0);
        assert_eq!(pricing.individual_price.discount.amount, 10.0);
    }

    #[tokio::test]
    async fn test_resolver_failure_degrades_to_undiscounted() {
        let mut resolver = MockDiscountResolver::new();
        resolver
            .expect_active_discount()
            .returning(|_| Err(CatalogError::Database("connection reset".to_string())));
        let engine = PricingEngine::new(resolver);
        let pricing = engine.calculate_best_option(&product(50.0), &[]).await;

        assert_eq!(pricing.individual_price.final_price, 50.0);
        assert_eq!(pricing.individual_price.discount.value, 0.0);
        assert_eq!(pricing.individual_price.discount.amount, 0.0);
    }

    #[tokio::test]
    async fn test_expired_discount_not_reported_as_applied() {
        let mut resolver = MockDiscountResolver::new();
        resolver.expect_active_discount().returning(|_| {
            Ok(Some(Discount {
                id: Uuid::new_v4(),
                discount_type: DiscountType::Fixed,
                value: 5.0,
                valid_from: None,
                valid_until: Some(chrono::DateTime::UNIX_EPOCH),
                is_active: true,
            }))
        });
        let engine = PricingEngine::new(resolver);
        let pricing = engine.calculate_best_option(&product(50.0), &[]).await;

        assert_eq!(pricing.individual_price.final_price, 50.0);
        assert_eq!(pricing.individual_price.discount.value, 0.0);
    }

    #[tokio::test]
    async fn test_pricing_wire_format() {
        let engine = PricingEngine::new(no_discounts());
        let combos = vec![combo("Bundle", 45.0, 55.0, None)];
        let pricing = engine.calculate_best_option(&product(55.0), &combos).await;

        let json = serde_json::to_value(&pricing).unwrap();
        assert_eq!(json["recommendedOption"], "combo");
        assert_eq!(json["availableCombos"][0]["savingsPercentage"], "18.18");
        assert_eq!(json["recommendedCombo"]["reason"], "largest available saving");
        assert!(json["individualPrice"].get("finalPrice").is_some());
    }
}
