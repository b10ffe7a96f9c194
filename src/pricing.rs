//! Quote computation for solar system configurations.
//!
//! Prices are fixed per system plan, structure type adds a flat surcharge,
//! GST is applied on top and an interest-free EMI is derived by dividing
//! the final total across the financing term.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::AppConfig;

/// A priced system plan selectable in the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemPlan {
    pub kw_size: i32,
    pub base_price: Decimal,
}

/// Looks up the catalog entry for a system type slug.
pub fn system_plan(system_type: &str) -> Option<SystemPlan> {
    let plan = match system_type {
        "basic_4kw" => SystemPlan {
            kw_size: 4,
            base_price: dec!(12000),
        },
        "standard_8kw" => SystemPlan {
            kw_size: 8,
            base_price: dec!(18000),
        },
        "premium_12kw" => SystemPlan {
            kw_size: 12,
            base_price: dec!(26000),
        },
        _ => return None,
    };
    Some(plan)
}

/// Flat installation surcharge for a mounting structure type.
/// Only high-rise installs carry an extra cost.
pub fn structure_surcharge(structure_type: &str) -> Option<Decimal> {
    let surcharge = match structure_type {
        "standard_roof" => Decimal::ZERO,
        "elevated" => Decimal::ZERO,
        "high_rise" => dec!(1500),
        _ => return None,
    };
    Some(surcharge)
}

/// Tunable pricing parameters, sourced from configuration.
#[derive(Debug, Clone)]
pub struct PricingParams {
    pub gst_rate: Decimal,
    pub financing_term_months: u32,
    pub currency: String,
}

impl PricingParams {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            gst_rate: Decimal::from_f64(cfg.gst_rate).unwrap_or_else(|| dec!(0.05)),
            financing_term_months: cfg.financing_term_months,
            currency: cfg.default_currency.clone(),
        }
    }
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            gst_rate: dec!(0.05),
            financing_term_months: 60,
            currency: "INR".to_string(),
        }
    }
}

/// A computed quote. All amounts are rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub total_system_cost: Decimal,
    pub gst_amount: Decimal,
    pub final_total: Decimal,
    pub monthly_emi: Decimal,
    pub currency: String,
}

/// Computes the full quote for a base price plus structure surcharge.
///
/// GST applies to the combined system cost and the EMI spreads the final
/// total evenly over the financing term with no interest.
pub fn compute_quote(
    base_price: Decimal,
    structure_surcharge: Decimal,
    params: &PricingParams,
) -> Quote {
    let total_system_cost = (base_price + structure_surcharge).round_dp(2);
    let gst_amount = (total_system_cost * params.gst_rate).round_dp(2);
    let final_total = (total_system_cost + gst_amount).round_dp(2);
    let term = Decimal::from(params.financing_term_months.max(1));
    let monthly_emi = (final_total / term).round_dp(2);

    Quote {
        total_system_cost,
        gst_amount,
        final_total,
        monthly_emi,
        currency: params.currency.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup() {
        let plan = system_plan("standard_8kw").unwrap();
        assert_eq!(plan.kw_size, 8);
        assert_eq!(plan.base_price, dec!(18000));

        assert_eq!(system_plan("basic_4kw").unwrap().base_price, dec!(12000));
        assert_eq!(system_plan("premium_12kw").unwrap().kw_size, 12);
        assert!(system_plan("mega_99kw").is_none());
    }

    #[test]
    fn surcharge_lookup() {
        assert_eq!(structure_surcharge("standard_roof"), Some(Decimal::ZERO));
        assert_eq!(structure_surcharge("elevated"), Some(Decimal::ZERO));
        assert_eq!(structure_surcharge("high_rise"), Some(dec!(1500)));
        assert!(structure_surcharge("underwater").is_none());
    }

    #[test]
    fn standard_elevated_quote() {
        let quote = compute_quote(dec!(18000), Decimal::ZERO, &PricingParams::default());
        assert_eq!(quote.total_system_cost, dec!(18000));
        assert_eq!(quote.gst_amount, dec!(900.00));
        assert_eq!(quote.final_total, dec!(18900.00));
        assert_eq!(quote.monthly_emi, dec!(315.00));
        assert_eq!(quote.currency, "INR");
    }

    #[test]
    fn high_rise_surcharge_is_taxed() {
        let quote = compute_quote(dec!(12000), dec!(1500), &PricingParams::default());
        assert_eq!(quote.total_system_cost, dec!(13500));
        assert_eq!(quote.gst_amount, dec!(675.00));
        assert_eq!(quote.final_total, dec!(14175.00));
        assert_eq!(quote.monthly_emi, dec!(236.25));
    }

    #[test]
    fn emi_rounds_to_two_places() {
        let params = PricingParams {
            financing_term_months: 36,
            ..Default::default()
        };
        let quote = compute_quote(dec!(26000), Decimal::ZERO, &params);
        assert_eq!(quote.final_total, dec!(27300.00));
        // 27300 / 36 = 758.333...
        assert_eq!(quote.monthly_emi, dec!(758.33));
    }

    #[test]
    fn zero_term_does_not_divide_by_zero() {
        let params = PricingParams {
            financing_term_months: 0,
            ..Default::default()
        };
        let quote = compute_quote(dec!(100), Decimal::ZERO, &params);
        assert_eq!(quote.monthly_emi, dec!(105.00));
    }
}
