use std::collections::HashMap;

use rust_decimal::Decimal;

use super::BillingError;
use super::pricing::round_money;
use crate::db::models::ExchangeRate;

/// Rates quoted against a single base currency.
#[derive(Debug, Clone)]
pub struct RateTable {
    base: String,
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().to_ascii_uppercase(),
            rates: HashMap::new(),
        }
    }

    /// Builds a table from stored rows; rows for other bases and non-positive
    /// or non-finite rates are skipped.
    pub fn from_rows(base: &str, rows: &[ExchangeRate]) -> Self {
        let mut table = Self::new(base);
        for row in rows.iter().filter(|r| r.base_currency.eq_ignore_ascii_case(base)) {
            if let Ok(rate) = Decimal::try_from(row.rate) {
                table.insert(&row.quote_currency, rate);
            }
        }
        table
    }

    pub fn insert(&mut self, quote: &str, rate: Decimal) {
        if rate > Decimal::ZERO {
            self.rates.insert(quote.to_ascii_uppercase(), rate);
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Units of `currency` per one unit of the base currency.
    fn rate_of(&self, currency: &str) -> Option<Decimal> {
        if currency == self.base {
            Some(Decimal::ONE)
        } else {
            self.rates.get(currency).copied()
        }
    }

    /// Unrounded rate for converting `from` into `to` through the base.
    pub fn cross_rate(&self, from: &str, to: &str) -> Result<Decimal, BillingError> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();
        if from == to {
            return Ok(Decimal::ONE);
        }

        let unavailable = || BillingError::RateUnavailable {
            from: from.clone(),
            to: to.clone(),
        };
        let from_rate = self.rate_of(&from).ok_or_else(unavailable)?;
        let to_rate = self.rate_of(&to).ok_or_else(unavailable)?;
        to_rate.checked_div(from_rate).ok_or_else(unavailable)
    }

    /// Converts and rounds to two decimal places, ties to even.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, BillingError> {
        Ok(round_money(amount * self.cross_rate(from, to)?))
    }

    /// Converts an amount held in minor units (cents), returning minor units.
    pub fn convert_cents(&self, cents: i64, from: &str, to: &str) -> Result<i64, BillingError> {
        let converted = self.convert(Decimal::new(cents, 2), from, to)?;
        let minor = (converted * Decimal::ONE_HUNDRED).trunc();
        i64::try_from(minor).map_err(|_| BillingError::RateUnavailable {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn table() -> RateTable {
        let mut table = RateTable::new("USD");
        table.insert("EUR", dec!(0.9));
        table.insert("GBP", dec!(0.8));
        table
    }

    #[test]
    fn same_currency_is_identity() {
        assert_eq!(table().convert(dec!(10.005), "XYZ", "xyz").unwrap(), dec!(10.00));
    }

    #[test]
    fn converts_from_and_to_base() {
        assert_eq!(table().convert(dec!(100), "USD", "EUR").unwrap(), dec!(90.00));
        assert_eq!(table().convert(dec!(90), "EUR", "USD").unwrap(), dec!(100.00));
    }

    #[test]
    fn converts_through_cross_rate() {
        // 100 EUR -> USD 111.11.. -> GBP 88.888..
        assert_eq!(table().convert(dec!(100), "EUR", "GBP").unwrap(), dec!(88.89));
    }

    #[test]
    fn missing_rate_is_an_error() {
        let err = table().convert(dec!(1), "USD", "JPY").unwrap_err();
        assert_eq!(
            err,
            BillingError::RateUnavailable {
                from: "USD".to_string(),
                to: "JPY".to_string()
            }
        );
    }

    #[test]
    fn converts_minor_units() {
        assert_eq!(table().convert_cents(12_345, "USD", "EUR").unwrap(), 11_110);
    }

    #[test]
    fn builds_from_stored_rows() {
        let row = |base: &str, quote: &str, rate: f64| ExchangeRate {
            base_currency: base.to_string(),
            quote_currency: quote.to_string(),
            rate,
            fetched_at: Utc::now(),
        };
        let rows = vec![row("USD", "EUR", 0.5), row("EUR", "GBP", 0.8), row("USD", "BAD", -1.0)];
        let table = RateTable::from_rows("USD", &rows);
        assert_eq!(table.len(), 1);
        assert_eq!(table.convert(dec!(3), "USD", "EUR").unwrap(), dec!(1.50));
    }
}
