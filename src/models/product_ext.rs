/// Extension methods for products entity
///
/// Pricing rules live here rather than on the generated entity in
/// entity/src/products.rs.
use crate::error::{ApiError, Result};
use entity::products;

/// How a product is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pricing {
    /// Fixed cost for a fixed number of days
    Flat { credits: i32, days: i32 },
    /// Cost scales with a buyer-chosen number of days
    PerDay {
        credits_per_day: i32,
        min_days: i32,
        max_days: i32,
    },
}

/// Price and length agreed at purchase time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub days: i32,
    pub cost: i32,
}

/// Extension trait for Product model
pub trait ProductExt {
    fn pricing(&self) -> Pricing;

    /// Resolve the purchase length and price for an optional requested length
    fn quote(&self, requested_days: Option<i32>) -> Result<Quote>;
}

impl ProductExt for products::Model {
    fn pricing(&self) -> Pricing {
        match self.price_per_day_credits {
            Some(credits_per_day) => {
                let min_days = self.min_days.unwrap_or(1).max(1);
                let max_days = self.max_days.unwrap_or(min_days).max(min_days);
                Pricing::PerDay {
                    credits_per_day,
                    min_days,
                    max_days,
                }
            }
            None => Pricing::Flat {
                credits: self.credits_cost,
                days: self.duration_days,
            },
        }
    }

    fn quote(&self, requested_days: Option<i32>) -> Result<Quote> {
        match self.pricing() {
            Pricing::Flat { credits, days } => match requested_days {
                Some(requested) if requested != days => Err(ApiError::DaysOutOfRange {
                    requested: Some(requested),
                    min: days,
                    max: days,
                }),
                _ => Ok(Quote {
                    days,
                    cost: credits,
                }),
            },
            Pricing::PerDay {
                credits_per_day,
                min_days,
                max_days,
            } => {
                let days = requested_days
                    .filter(|d| (min_days..=max_days).contains(d))
                    .ok_or(ApiError::DaysOutOfRange {
                        requested: requested_days,
                        min: min_days,
                        max: max_days,
                    })?;
                let cost = credits_per_day.checked_mul(days).ok_or_else(|| {
                    ApiError::BadRequest(format!("Price overflow for {} days", days))
                })?;
                Ok(Quote { days, cost })
            }
        }
    }
}
