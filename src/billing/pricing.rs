use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Each seat is priced in the tier it falls in.
    #[default]
    Graduated,
    /// Every seat is priced at the tier the total falls in.
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Annual,
}

impl BillingPeriod {
    pub fn months(self) -> u32 {
        match self {
            BillingPeriod::Monthly => 1,
            BillingPeriod::Annual => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Inclusive upper seat bound; `None` for the last, unbounded tier.
    pub up_to: Option<u32>,
    pub unit_price: Decimal,
    pub flat_fee: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteLine {
    pub tier: usize,
    pub first_seat: u32,
    pub last_seat: u32,
    pub seats: u32,
    pub unit_price: Decimal,
    pub flat_fee: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedTotal {
    pub currency: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub seats: u32,
    pub mode: PricingMode,
    pub period: BillingPeriod,
    pub currency: String,
    pub lines: Vec<QuoteLine>,
    pub monthly_subtotal: Decimal,
    pub months: u32,
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub converted: Option<ConvertedTotal>,
}

#[derive(Debug, Clone)]
pub struct PricingPlan {
    pub currency: String,
    pub tiers: Vec<PriceTier>,
    pub annual_discount_percent: Decimal,
}

impl PricingPlan {
    /// Tiers must have strictly increasing bounds and end with an unbounded tier.
    pub fn new(
        currency: impl Into<String>,
        tiers: Vec<PriceTier>,
        annual_discount_percent: Decimal,
    ) -> Result<Self, BillingError> {
        if tiers.is_empty() {
            return Err(BillingError::InvalidTiers("no tiers".to_string()));
        }
        let mut previous = 0u32;
        for (i, tier) in tiers.iter().enumerate() {
            let last = i == tiers.len() - 1;
            match (tier.up_to, last) {
                (None, true) => {}
                (None, false) => {
                    return Err(BillingError::InvalidTiers(format!(
                        "tier {} is unbounded but not last",
                        i
                    )));
                }
                (Some(_), true) => {
                    return Err(BillingError::InvalidTiers(
                        "last tier must be unbounded".to_string(),
                    ));
                }
                (Some(up_to), false) if up_to <= previous => {
                    return Err(BillingError::InvalidTiers(format!(
                        "tier {} bound {} does not increase",
                        i, up_to
                    )));
                }
                (Some(up_to), false) => previous = up_to,
            }
            if tier.unit_price.is_sign_negative() || tier.flat_fee.is_sign_negative() {
                return Err(BillingError::InvalidTiers(format!("tier {} has a negative price", i)));
            }
        }

        Ok(Self {
            currency: currency.into(),
            tiers,
            annual_discount_percent,
        })
    }

    /// The seat plan offered to organizations.
    pub fn standard(currency: impl Into<String>, annual_discount_percent: u32) -> Self {
        Self {
            currency: currency.into(),
            tiers: vec![
                PriceTier {
                    up_to: Some(10),
                    unit_price: Decimal::new(1200, 2),
                    flat_fee: Decimal::ZERO,
                },
                PriceTier {
                    up_to: Some(50),
                    unit_price: Decimal::new(1000, 2),
                    flat_fee: Decimal::new(2000, 2),
                },
                PriceTier {
                    up_to: Some(200),
                    unit_price: Decimal::new(800, 2),
                    flat_fee: Decimal::new(5000, 2),
                },
                PriceTier {
                    up_to: None,
                    unit_price: Decimal::new(600, 2),
                    flat_fee: Decimal::new(10000, 2),
                },
            ],
            annual_discount_percent: Decimal::from(annual_discount_percent),
        }
    }

    pub fn quote(
        &self,
        seats: u32,
        mode: PricingMode,
        period: BillingPeriod,
    ) -> Result<Quote, BillingError> {
        if seats == 0 {
            return Err(BillingError::NoSeats);
        }

        let lines = match mode {
            PricingMode::Graduated => self.graduated_lines(seats),
            PricingMode::Volume => self.volume_lines(seats),
        };

        let monthly_subtotal: Decimal = lines.iter().map(|line| line.amount).sum();
        let months = period.months();
        let subtotal = monthly_subtotal * Decimal::from(months);
        let discount_percent = match period {
            BillingPeriod::Monthly => Decimal::ZERO,
            BillingPeriod::Annual => self.annual_discount_percent,
        };
        let discount = round_money(subtotal * discount_percent / Decimal::ONE_HUNDRED);
        let total = round_money(subtotal - discount);

        Ok(Quote {
            seats,
            mode,
            period,
            currency: self.currency.clone(),
            lines,
            monthly_subtotal: round_money(monthly_subtotal),
            months,
            subtotal: round_money(subtotal),
            discount_percent,
            discount,
            total,
            converted: None,
        })
    }

    fn graduated_lines(&self, seats: u32) -> Vec<QuoteLine> {
        let mut lines = Vec::new();
        let mut lower = 0u32;
        for (i, tier) in self.tiers.iter().enumerate() {
            if seats <= lower {
                break;
            }
            let upper = tier.up_to.map_or(seats, |bound| bound.min(seats));
            let in_tier = upper - lower;
            lines.push(QuoteLine {
                tier: i,
                first_seat: lower + 1,
                last_seat: upper,
                seats: in_tier,
                unit_price: tier.unit_price,
                flat_fee: tier.flat_fee,
                amount: tier.unit_price * Decimal::from(in_tier) + tier.flat_fee,
            });
            lower = upper;
        }
        lines
    }

    fn volume_lines(&self, seats: u32) -> Vec<QuoteLine> {
        let index = self
            .tiers
            .iter()
            .position(|tier| tier.up_to.is_none_or(|bound| seats <= bound))
            .unwrap_or(self.tiers.len() - 1);
        let tier = &self.tiers[index];
        vec![QuoteLine {
            tier: index,
            first_seat: 1,
            last_seat: seats,
            seats,
            unit_price: tier.unit_price,
            flat_fee: tier.flat_fee,
            amount: tier.unit_price * Decimal::from(seats) + tier.flat_fee,
        }]
    }
}

/// Two decimal places, ties to even.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn plan() -> PricingPlan {
        PricingPlan::standard("USD", 15)
    }

    #[test]
    fn graduated_pricing_spans_tiers() {
        let quote = plan()
            .quote(60, PricingMode::Graduated, BillingPeriod::Monthly)
            .unwrap();
        // 10 x 12 + (40 x 10 + 20) + (10 x 8 + 50)
        assert_eq!(quote.lines.len(), 3);
        assert_eq!(quote.lines[1].first_seat, 11);
        assert_eq!(quote.lines[1].seats, 40);
        assert_eq!(quote.monthly_subtotal, dec!(670.00));
        assert_eq!(quote.total, dec!(670.00));
    }

    #[test]
    fn flat_fee_only_for_touched_tiers() {
        let quote = plan()
            .quote(10, PricingMode::Graduated, BillingPeriod::Monthly)
            .unwrap();
        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.total, dec!(120.00));
    }

    #[test]
    fn volume_pricing_uses_single_tier() {
        let quote = plan().quote(60, PricingMode::Volume, BillingPeriod::Monthly).unwrap();
        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.lines[0].tier, 2);
        assert_eq!(quote.total, dec!(530.00));

        let unbounded = plan().quote(500, PricingMode::Volume, BillingPeriod::Monthly).unwrap();
        assert_eq!(unbounded.lines[0].tier, 3);
        assert_eq!(unbounded.total, dec!(3100.00));
    }

    #[test]
    fn annual_period_applies_discount() {
        let quote = plan()
            .quote(5, PricingMode::Graduated, BillingPeriod::Annual)
            .unwrap();
        assert_eq!(quote.subtotal, dec!(720.00));
        assert_eq!(quote.discount, dec!(108.00));
        assert_eq!(quote.total, dec!(612.00));
    }

    #[test]
    fn zero_seats_is_rejected() {
        assert_eq!(
            plan().quote(0, PricingMode::Graduated, BillingPeriod::Monthly).unwrap_err(),
            BillingError::NoSeats
        );
    }

    #[test]
    fn rejects_malformed_tiers() {
        let tier = |up_to| PriceTier {
            up_to,
            unit_price: dec!(1),
            flat_fee: dec!(0),
        };
        assert!(PricingPlan::new("USD", vec![], dec!(0)).is_err());
        assert!(PricingPlan::new("USD", vec![tier(Some(10))], dec!(0)).is_err());
        assert!(PricingPlan::new("USD", vec![tier(None), tier(None)], dec!(0)).is_err());
        assert!(PricingPlan::new("USD", vec![tier(Some(10)), tier(Some(5)), tier(None)], dec!(0)).is_err());
        assert!(PricingPlan::new("USD", vec![tier(Some(10)), tier(None)], dec!(0)).is_ok());
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.34));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
    }
}
