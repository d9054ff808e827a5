use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{StoreError, StoreResult};
use crate::models::{date_from_db, money_from_db};

/// Invoice header.
///
/// Immutable once committed; the only mutation is full deletion through
/// the invoice transaction manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Surrogate key
    pub invoice_id: i64,

    /// Owning customer
    pub customer_id: i64,

    /// Local time the invoice was committed
    pub date: NaiveDateTime,

    /// Sum of the item subtotals at commit time
    pub total_amount: Decimal,
}

#[derive(Debug, FromRow)]
pub(crate) struct InvoiceRow {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub date: String,
    pub total_amount: f64,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = StoreError;

    fn try_from(row: InvoiceRow) -> StoreResult<Self> {
        Ok(Invoice {
            invoice_id: row.invoice_id,
            customer_id: row.customer_id,
            date: date_from_db(&row.date)?,
            total_amount: money_from_db(row.total_amount)?,
        })
    }
}

/// One invoice line.
///
/// `product_name` and `unit_price` are copied from the catalog at sale
/// time, so later catalog edits never alter a recorded invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub item_id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub subtotal: Decimal,
}

#[derive(Debug, FromRow)]
pub(crate) struct InvoiceItemRow {
    pub item_id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub subtotal: f64,
}

impl TryFrom<InvoiceItemRow> for InvoiceItem {
    type Error = StoreError;

    fn try_from(row: InvoiceItemRow) -> StoreResult<Self> {
        Ok(InvoiceItem {
            item_id: row.item_id,
            invoice_id: row.invoice_id,
            product_id: row.product_id,
            product_name: row.product_name,
            unit_price: money_from_db(row.unit_price)?,
            quantity: row.quantity,
            subtotal: money_from_db(row.subtotal)?,
        })
    }
}

/// Invoice list entry (header joined with the customer's name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub invoice_id: i64,
    pub customer_name: String,
    pub date: NaiveDateTime,
    pub total_amount: Decimal,
}

#[derive(Debug, FromRow)]
pub(crate) struct InvoiceSummaryRow {
    pub invoice_id: i64,
    pub customer_name: String,
    pub date: String,
    pub total_amount: f64,
}

impl TryFrom<InvoiceSummaryRow> for InvoiceSummary {
    type Error = StoreError;

    fn try_from(row: InvoiceSummaryRow) -> StoreResult<Self> {
        Ok(InvoiceSummary {
            invoice_id: row.invoice_id,
            customer_name: row.customer_name,
            date: date_from_db(&row.date)?,
            total_amount: money_from_db(row.total_amount)?,
        })
    }
}

/// Invoice with its lines, as shown on the invoice detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

impl InvoiceDetail {
    /// Sum of the recorded line subtotals.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|item| item.subtotal).sum()
    }
}
