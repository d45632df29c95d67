//! Fee-aware resale profitability.

use serde::{Deserialize, Serialize};

use crate::config::ProfitConfig;

/// Rounds half away from negative infinity, like a browser's `Math.round`.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Itemized costs behind a profitability verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Purchase price on the source marketplace.
    pub source_price: f64,
    /// Flat shipping cost.
    pub shipping_cost: f64,
    /// Source commission, rounded up. Reported only, not deducted.
    pub source_commission: f64,
    /// Source price plus shipping.
    pub acquisition_cost: f64,
    /// Target commission, rounded up.
    pub target_commission: f64,
    /// Flat target fulfillment fee.
    pub target_fulfillment_fee: f64,
    /// Every deducted cost.
    pub total_cost: f64,
}

/// Outcome of a profitability computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityResult {
    /// Whether the rate clears the configured minimum.
    pub is_profitable: bool,
    /// Revenue minus costs.
    pub profit: f64,
    /// Profit as a percentage of revenue, one decimal place.
    pub profit_rate_percent: f64,
    /// Itemized costs; absent when a price was missing.
    pub breakdown: Option<CostBreakdown>,
    /// Target price.
    pub revenue: f64,
    /// Human-readable verdict.
    pub verdict_message: String,
}

impl ProfitabilityResult {
    fn missing_price() -> Self {
        Self {
            is_profitable: false,
            profit: 0.0,
            profit_rate_percent: 0.0,
            breakdown: None,
            revenue: 0.0,
            verdict_message: "Price information is missing".to_string(),
        }
    }
}

fn usable(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p != 0.0)
}

/// Computes resale profitability from a source and a target price.
#[derive(Debug, Clone, Default)]
pub struct ProfitCalculator {
    config: ProfitConfig,
}

impl ProfitCalculator {
    /// Creates a calculator with the given fee model.
    #[must_use]
    pub fn new(config: ProfitConfig) -> Self {
        Self { config }
    }

    /// Returns the fee model.
    #[must_use]
    pub fn config(&self) -> &ProfitConfig {
        &self.config
    }

    /// Computes the verdict.
    ///
    /// A missing, zero or non-finite price short-circuits to an unprofitable
    /// result with zero profit.
    #[must_use]
    pub fn compute(&self, source_price: Option<f64>, target_price: Option<f64>) -> ProfitabilityResult {
        let (Some(source), Some(target)) = (usable(source_price), usable(target_price)) else {
            return ProfitabilityResult::missing_price();
        };
        let fees = &self.config;

        let source_commission = (source * fees.source_commission_rate).ceil();
        let acquisition_cost = source + fees.shipping_cost;
        let target_commission = (target * fees.target_commission_rate).ceil();
        let total_cost = acquisition_cost + target_commission + fees.target_fulfillment_fee;
        let profit = target - total_cost;

        let raw_rate = profit / target * 100.0;
        let profit_rate_percent = round_half_up(raw_rate * 10.0) / 10.0;
        let is_profitable = profit_rate_percent >= fees.minimum_profit_rate_percent;

        let shown_rate = round_half_up(raw_rate);
        let verdict_message = if is_profitable {
            format!(
                "Profit rate {shown_rate}% clears the {}% threshold",
                fees.minimum_profit_rate_percent
            )
        } else {
            format!(
                "Profit rate {shown_rate}% is below the recommended {}%",
                fees.minimum_profit_rate_percent
            )
        };

        ProfitabilityResult {
            is_profitable,
            profit,
            profit_rate_percent,
            breakdown: Some(CostBreakdown {
                source_price: source,
                shipping_cost: fees.shipping_cost,
                source_commission,
                acquisition_cost,
                target_commission,
                target_fulfillment_fee: fees.target_fulfillment_fee,
                total_cost,
            }),
            revenue: target,
            verdict_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn calculator() -> ProfitCalculator {
        ProfitCalculator::default()
    }

    #[test]
    fn test_below_threshold() {
        let result = calculator().compute(Some(1000.0), Some(3000.0));
        let breakdown = result.breakdown.clone().unwrap();

        assert_eq!(breakdown.acquisition_cost, 1500.0);
        assert_eq!(breakdown.source_commission, 100.0);
        assert_eq!(breakdown.target_commission, 450.0);
        assert_eq!(breakdown.target_fulfillment_fee, 500.0);
        assert_eq!(breakdown.total_cost, 2450.0);
        assert_eq!(result.profit, 550.0);
        assert_eq!(result.profit_rate_percent, 18.3);
        assert_eq!(result.revenue, 3000.0);
        assert!(!result.is_profitable);
        assert_eq!(result.verdict_message, "Profit rate 18% is below the recommended 20%");
    }

    #[test]
    fn test_above_threshold() {
        let result = calculator().compute(Some(1000.0), Some(5000.0));

        assert_eq!(result.breakdown.unwrap().total_cost, 2750.0);
        assert_eq!(result.profit, 2250.0);
        assert_eq!(result.profit_rate_percent, 45.0);
        assert!(result.is_profitable);
        assert_eq!(result.verdict_message, "Profit rate 45% clears the 20% threshold");
    }

    #[test]
    fn test_missing_or_zero_prices() {
        for (source, target) in [
            (None, Some(3000.0)),
            (Some(1000.0), None),
            (Some(0.0), Some(3000.0)),
            (Some(1000.0), Some(f64::NAN)),
        ] {
            let result = calculator().compute(source, target);
            assert!(!result.is_profitable);
            assert_eq!(result.profit, 0.0);
            assert!(result.breakdown.is_none());
            assert_eq!(result.verdict_message, "Price information is missing");
        }
    }

    #[test]
    fn test_commissions_round_up() {
        let result = calculator().compute(Some(999.0), Some(1001.0));
        let breakdown = result.breakdown.unwrap();
        assert_eq!(breakdown.source_commission, 100.0);
        assert_eq!(breakdown.target_commission, 151.0);
        assert!(result.profit < 0.0);
        assert!(!result.is_profitable);
    }

    #[test]
    fn test_custom_fee_model() {
        let calculator = ProfitCalculator::new(ProfitConfig {
            shipping_cost: 0.0,
            target_fulfillment_fee: 0.0,
            ..ProfitConfig::default()
        });
        let result = calculator.compute(Some(1000.0), Some(2000.0));
        assert_eq!(result.profit, 700.0);
        assert_eq!(result.profit_rate_percent, 35.0);
        assert_eq!(calculator.config().target_commission_rate, 0.15);
    }

    #[test]
    fn test_rate_is_pure() {
        let a = calculator().compute(Some(1234.0), Some(4321.0));
        let b = calculator().compute(Some(1234.0), Some(4321.0));
        assert_eq!(a, b);
    }
}
