use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{StoreError, StoreResult};
use crate::models::{money_from_db, round_money};

/// Product model representing one sellable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Surrogate key
    pub product_id: i64,

    /// Catalog name (unique)
    pub name: String,

    /// Current unit price
    pub price: Decimal,

    /// Units on hand
    pub stock: i64,
}

/// Raw `products` row; `price` is a `REAL` column.
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> StoreResult<Self> {
        Ok(Product {
            product_id: row.product_id,
            name: row.name,
            price: money_from_db(row.price)?,
            stock: row.stock,
        })
    }
}

/// Product form submission, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
}

impl ProductForm {
    /// Trims the name, rejects negative price or stock, and rounds the
    /// price to the money scale.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty name, a negative price or negative stock.
    pub fn normalized(&self) -> StoreResult<ProductForm> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("product name must not be empty"));
        }
        if self.price < Decimal::ZERO {
            return Err(StoreError::validation("price must not be negative"));
        }
        if self.stock < 0 {
            return Err(StoreError::validation("stock must not be negative"));
        }

        Ok(ProductForm {
            name: name.to_string(),
            price: round_money(self.price),
            stock: self.stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: Decimal, stock: i64) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price,
            stock,
        }
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let normalized = form("  Tea ", Decimal::new(250, 2), 4)
            .normalized()
            .expect("valid");
        assert_eq!(normalized.name, "Tea");
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = form("Tea", Decimal::new(-1, 0), 4).normalized();
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let result = form("Tea", Decimal::ZERO, -1).normalized();
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_price_rounded_to_cents() {
        let normalized = form("Tea", Decimal::new(2718281828, 9), 4)
            .normalized()
            .expect("valid");
        assert_eq!(normalized.price, Decimal::new(272, 2));
    }

    #[test]
    fn test_free_product_allowed() {
        assert!(form("Sample", Decimal::ZERO, 0).normalized().is_ok());
    }
}
