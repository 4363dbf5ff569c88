//! Static product / plan / discount catalog.
//!
//! The catalog is immutable input. Generation stages borrow it and
//! never mutate it.

use crate::{
    error::{SimError, SimResult},
    types::{Money, RowId},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: RowId,
    pub product_name: String,
    pub product_description: String,
}

/// Plan level within a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Free,
    Pro,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Pro => "Pro",
            Tier::Premium => "Premium",
        }
    }

    /// Tiers a subscription on this tier may switch to.
    pub fn switch_targets(&self) -> &'static [Tier] {
        match self {
            Tier::Free => &[Tier::Pro, Tier::Premium],
            Tier::Pro => &[Tier::Premium],
            Tier::Premium => &[Tier::Pro],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    Monthly,
    Yearly,
}

impl BillingFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingFrequency::Monthly => "monthly",
            BillingFrequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: RowId,
    pub product_id: RowId,
    pub plan_name: Tier,
    pub plan_price: Money,
    pub recurring: BillingFrequency,
}

impl Plan {
    pub fn is_free(&self) -> bool {
        self.plan_price.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percent,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Fixed => "fixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub discount_id: RowId,
    pub discount_code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    /// None = applies to all products.
    pub product_id: Option<RowId>,
    /// None = applies to all plans.
    pub plan_id: Option<RowId>,
    pub is_recurring: bool,
}

impl Discount {
    /// Product/plan scope check.
    pub fn is_in_scope(&self, plan: &Plan) -> bool {
        self.product_id.map_or(true, |p| p == plan.product_id)
            && self.plan_id.map_or(true, |p| p == plan.plan_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProductsFile {
    products: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlansFile {
    plans: Vec<Plan>,
}

#[derive(Debug, Clone, Deserialize)]
struct DiscountsFile {
    discounts: Vec<Discount>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub plans: Vec<Plan>,
    pub discounts: Vec<Discount>,
}

impl Catalog {
    /// Load from the data/catalog directory.
    /// In tests, use Catalog::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let products_path = format!("{data_dir}/catalog/products.json");
        let products_content = std::fs::read_to_string(&products_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {products_path}: {e}"))?;
        let products: ProductsFile = serde_json::from_str(&products_content)?;

        let plans_path = format!("{data_dir}/catalog/plans.json");
        let plans_content = std::fs::read_to_string(&plans_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {plans_path}: {e}"))?;
        let plans: PlansFile = serde_json::from_str(&plans_content)?;

        let discounts_path = format!("{data_dir}/catalog/discounts.json");
        let discounts_content = std::fs::read_to_string(&discounts_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {discounts_path}: {e}"))?;
        let discounts: DiscountsFile = serde_json::from_str(&discounts_content)?;

        Ok(Self {
            products: products.products,
            plans: plans.plans,
            discounts: discounts.discounts,
        })
    }

    pub fn plan(&self, plan_id: RowId) -> SimResult<&Plan> {
        self.plans
            .iter()
            .find(|p| p.plan_id == plan_id)
            .ok_or(SimError::UnknownPlan { plan_id })
    }

    pub fn discount(&self, discount_id: RowId) -> Option<&Discount> {
        self.discounts.iter().find(|d| d.discount_id == discount_id)
    }

    /// Plans of the same product whose tier is a switch target of
    /// `plan`'s tier, in catalog order. Empty means no switch.
    pub fn switch_candidates(&self, plan: &Plan) -> Vec<&Plan> {
        let targets = plan.plan_name.switch_targets();
        self.plans
            .iter()
            .filter(|p| p.product_id == plan.product_id && targets.contains(&p.plan_name))
            .collect()
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.plans.is_empty() {
            return Err(SimError::invalid_config("catalog has no plans"));
        }

        let mut product_ids = HashSet::new();
        for product in &self.products {
            if !product_ids.insert(product.product_id) {
                return Err(SimError::invalid_config(format!(
                    "duplicate product_id {}",
                    product.product_id
                )));
            }
        }

        let mut plan_ids = HashSet::new();
        for plan in &self.plans {
            if !plan_ids.insert(plan.plan_id) {
                return Err(SimError::invalid_config(format!(
                    "duplicate plan_id {}",
                    plan.plan_id
                )));
            }
            if !product_ids.contains(&plan.product_id) {
                return Err(SimError::invalid_config(format!(
                    "plan {} references unknown product {}",
                    plan.plan_id, plan.product_id
                )));
            }
            if plan.plan_price.is_sign_negative() {
                return Err(SimError::invalid_config(format!(
                    "plan {} has negative price {}",
                    plan.plan_id, plan.plan_price
                )));
            }
        }

        let mut discount_ids = HashSet::new();
        for d in &self.discounts {
            if !discount_ids.insert(d.discount_id) {
                return Err(SimError::invalid_config(format!(
                    "duplicate discount_id {}",
                    d.discount_id
                )));
            }
            if d.valid_to < d.valid_from {
                return Err(SimError::invalid_config(format!(
                    "discount {} valid_to {} precedes valid_from {}",
                    d.discount_code, d.valid_to, d.valid_from
                )));
            }
            if d.discount_value.is_sign_negative() {
                return Err(SimError::invalid_config(format!(
                    "discount {} has negative value",
                    d.discount_code
                )));
            }
            if let Some(product_id) = d.product_id {
                if !product_ids.contains(&product_id) {
                    return Err(SimError::invalid_config(format!(
                        "discount {} scoped to unknown product {product_id}",
                        d.discount_code
                    )));
                }
            }
            if let Some(plan_id) = d.plan_id {
                if !plan_ids.contains(&plan_id) {
                    return Err(SimError::invalid_config(format!(
                        "discount {} scoped to unknown plan {plan_id}",
                        d.discount_code
                    )));
                }
            }
        }
        Ok(())
    }

    /// Reference catalog: three products with Free/Pro/Premium tiers
    /// each, and a single one-time welcome discount.
    pub fn default_test() -> Self {
        let product = |id: RowId, name: &str, description: &str| Product {
            product_id: id,
            product_name: name.into(),
            product_description: description.into(),
        };
        let plan = |plan_id: RowId, product_id: RowId, tier: Tier, price: i64, recurring| Plan {
            plan_id,
            product_id,
            plan_name: tier,
            plan_price: Decimal::from(price),
            recurring,
        };
        use BillingFrequency::{Monthly, Yearly};

        Self {
            products: vec![
                product(1, "AutomateSRC", "Workflow automation tool"),
                product(2, "CollabSRC", "Team collaboration platform"),
                product(3, "InsightSRC", "Business analytics platform"),
            ],
            plans: vec![
                plan(101, 1, Tier::Free, 0, Monthly),
                plan(102, 1, Tier::Pro, 100, Monthly),
                plan(103, 1, Tier::Premium, 1000, Yearly),
                plan(201, 2, Tier::Free, 0, Monthly),
                plan(202, 2, Tier::Pro, 50, Monthly),
                plan(203, 2, Tier::Premium, 400, Yearly),
                plan(301, 3, Tier::Free, 0, Monthly),
                plan(302, 3, Tier::Pro, 200, Monthly),
                plan(303, 3, Tier::Premium, 2000, Yearly),
            ],
            discounts: vec![Discount {
                discount_id: 1,
                discount_code: "WELCOME20".into(),
                discount_type: DiscountType::Percent,
                discount_value: Decimal::from(20),
                valid_from: NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date"),
                valid_to: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date"),
                product_id: None,
                plan_id: None,
                is_recurring: false,
            }],
        }
    }
}
