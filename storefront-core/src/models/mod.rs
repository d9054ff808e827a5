pub mod customer;
pub mod invoice;
pub mod product;

pub use customer::{Customer, CustomerForm};
pub use invoice::{Invoice, InvoiceDetail, InvoiceItem, InvoiceSummary};
pub use product::{Product, ProductForm};

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{StoreError, StoreResult};

/// Text layout of `invoices.date`; the month/day reports slice it with
/// `STRFTIME`, so it must stay SQLite-parsable.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decimal places kept for every amount. Prices are rounded to it on the
/// way in, so subtotals and totals stay exact through the `REAL` columns.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to [`MONEY_SCALE`], half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Reads a `REAL` money column into a decimal.
pub(crate) fn money_from_db(value: f64) -> StoreResult<Decimal> {
    Decimal::try_from(value)
        .map(round_money)
        .map_err(|e| StoreError::validation(format!("stored amount {} is not a decimal: {}", value, e)))
}

/// Converts a decimal amount for a `REAL` money column.
pub(crate) fn money_to_db(value: Decimal) -> StoreResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| StoreError::validation(format!("amount {} is out of range", value)))
}

pub(crate) fn date_from_db(value: &str) -> StoreResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| StoreError::validation(format!("stored date {:?} is malformed: {}", value, e)))
}

pub(crate) fn date_to_db(value: NaiveDateTime) -> String {
    value.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_money_survives_real_column() {
        let price = Decimal::new(1999, 2);
        let stored = money_to_db(price).expect("in range");
        assert_eq!(money_from_db(stored).expect("decimal"), price);
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(2718281828, 9)), Decimal::new(272, 2));
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(-1005, 3)), Decimal::new(-101, 2));
    }

    #[test]
    fn test_date_format_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 5)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap();
        let stored = date_to_db(date);
        assert_eq!(stored, "2024-10-05 14:03:09");
        assert_eq!(date_from_db(&stored).expect("parsable"), date);
    }
}
