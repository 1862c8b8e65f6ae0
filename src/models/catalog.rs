use entity::{products, sea_orm_active_enums::BumpWindow};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::product_ext::{Pricing, ProductExt};

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "kind")]
pub enum PricingView {
    #[serde(rename = "flat", rename_all = "camelCase")]
    Flat { credits: i32, days: i32 },
    #[serde(rename = "perDay", rename_all = "camelCase")]
    PerDay {
        credits_per_day: i32,
        min_days: i32,
        max_days: i32,
    },
}

impl From<Pricing> for PricingView {
    fn from(pricing: Pricing) -> Self {
        match pricing {
            Pricing::Flat { credits, days } => Self::Flat { credits, days },
            Pricing::PerDay {
                credits_per_day,
                min_days,
                max_days,
            } => Self::PerDay {
                credits_per_day,
                min_days,
                max_days,
            },
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub code: String,
    pub label: String,
    pub window_type: BumpWindow,
    pub quantity_per_window: i32,
    pub pricing: PricingView,
    pub active: bool,
}

impl From<products::Model> for ProductView {
    fn from(product: products::Model) -> Self {
        let pricing = product.pricing().into();
        Self {
            code: product.code,
            label: product.label,
            window_type: product.window_type,
            quantity_per_window: product.quantity_per_window,
            pricing,
            active: product.active,
        }
    }
}

/// Admin request to add a product to the catalog
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,

    #[validate(length(min = 1, max = 255))]
    pub label: String,

    pub window_type: BumpWindow,

    #[validate(range(min = 1, max = 24))]
    pub quantity_per_window: i32,

    #[validate(range(min = 1, max = 365))]
    pub duration_days: i32,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub credits_cost: i32,

    #[validate(range(min = 0))]
    pub price_per_day_credits: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub min_days: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub max_days: Option<i32>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Admin request to edit a product.
///
/// Label and visibility may always change; the remaining fields are the
/// product's terms and freeze once any purchase references the product.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub label: Option<String>,

    pub active: Option<bool>,

    pub window_type: Option<BumpWindow>,

    #[validate(range(min = 1, max = 24))]
    pub quantity_per_window: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub duration_days: Option<i32>,

    #[validate(range(min = 0))]
    pub credits_cost: Option<i32>,

    #[validate(range(min = 0))]
    pub price_per_day_credits: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub min_days: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub max_days: Option<i32>,
}

impl UpdateProductRequest {
    /// Whether the request changes pricing or cadence of `current`
    pub fn changes_terms(&self, current: &products::Model) -> bool {
        fn differs<T: PartialEq>(requested: Option<T>, current: T) -> bool {
            requested.is_some_and(|value| value != current)
        }

        differs(self.window_type, current.window_type)
            || differs(self.quantity_per_window, current.quantity_per_window)
            || differs(self.duration_days, current.duration_days)
            || differs(self.credits_cost, current.credits_cost)
            || differs(self.price_per_day_credits.map(Some), current.price_per_day_credits)
            || differs(self.min_days.map(Some), current.min_days)
            || differs(self.max_days.map(Some), current.max_days)
    }
}
