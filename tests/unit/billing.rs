// Seat pricing and currency conversion

use pmis_backend::billing::{
    BillingError,
    exchange::RateTable,
    pricing::{BillingPeriod, PriceTier, PricingMode, PricingPlan},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn graduated_quote_spans_tiers() {
    let plan = PricingPlan::standard("USD", 20);
    let quote = plan.quote(12, PricingMode::Graduated, BillingPeriod::Monthly).unwrap();

    // 10 x 12.00 + (2 x 10.00 + 20.00 flat)
    assert_eq!(quote.lines.len(), 2);
    assert_eq!(quote.lines[1].first_seat, 11);
    assert_eq!(quote.lines[1].seats, 2);
    assert_eq!(quote.total, dec!(160.00));
    assert_eq!(quote.discount, Decimal::ZERO);
}

#[test]
fn annual_period_applies_discount() {
    let plan = PricingPlan::standard("USD", 20);
    let quote = plan.quote(12, PricingMode::Graduated, BillingPeriod::Annual).unwrap();
    assert_eq!(quote.months, 12);
    assert_eq!(quote.subtotal, dec!(1920.00));
    assert_eq!(quote.discount, dec!(384.00));
    assert_eq!(quote.total, dec!(1536.00));
}

#[test]
fn volume_quote_prices_every_seat_in_one_tier() {
    let plan = PricingPlan::standard("USD", 0);
    let quote = plan.quote(12, PricingMode::Volume, BillingPeriod::Monthly).unwrap();
    assert_eq!(quote.lines.len(), 1);
    assert_eq!(quote.lines[0].tier, 1);
    assert_eq!(quote.total, dec!(140.00));
}

#[test]
fn zero_seats_and_bad_tiers_are_rejected() {
    let plan = PricingPlan::standard("USD", 0);
    assert_eq!(
        plan.quote(0, PricingMode::Graduated, BillingPeriod::Monthly).unwrap_err(),
        BillingError::NoSeats
    );

    let bounded_last = vec![PriceTier {
        up_to: Some(5),
        unit_price: dec!(1),
        flat_fee: dec!(0),
    }];
    assert!(PricingPlan::new("USD", bounded_last, dec!(0)).is_err());
}

#[test]
fn quote_total_converts_through_rate_table() {
    let plan = PricingPlan::standard("USD", 0);
    let quote = plan.quote(5, PricingMode::Graduated, BillingPeriod::Monthly).unwrap();

    let mut rates = RateTable::new("usd");
    rates.insert("eur", dec!(0.92));
    assert_eq!(rates.base(), "USD");
    assert_eq!(rates.convert(quote.total, "USD", "EUR").unwrap(), dec!(55.20));
    assert!(matches!(
        rates.convert(quote.total, "USD", "JPY"),
        Err(BillingError::RateUnavailable { .. })
    ));
}
