use sqlx::SqlitePool;
use tracing::instrument;

use crate::error::{StoreError, StoreResult};
use crate::models::invoice::{InvoiceItemRow, InvoiceRow, InvoiceSummaryRow};
use crate::models::{Invoice, InvoiceDetail, InvoiceItem, InvoiceSummary};

/// Read-only access to invoices and their lines.
///
/// Invoices are written and removed only by
/// [`InvoiceManager`](crate::sales::InvoiceManager).
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Invoice list with customer names, newest first.
    pub async fn list(&self) -> StoreResult<Vec<InvoiceSummary>> {
        sqlx::query_as::<_, InvoiceSummaryRow>(
            r#"
            SELECT i.invoice_id, c.name AS customer_name, i.date, i.total_amount
            FROM invoices i
            JOIN customers c ON i.customer_id = c.customer_id
            ORDER BY i.date DESC, i.invoice_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(InvoiceSummary::try_from)
        .collect()
    }

    /// Reads one invoice header.
    ///
    /// # Errors
    ///
    /// `NotFound` if no invoice has this id.
    pub async fn get(&self, invoice_id: i64) -> StoreResult<Invoice> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            "SELECT invoice_id, customer_id, date, total_amount FROM invoices WHERE invoice_id = ?",
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("invoice", invoice_id))?;

        Invoice::try_from(row)
    }

    /// Lines of one invoice in insertion order. Empty for an unknown id.
    pub async fn items(&self, invoice_id: i64) -> StoreResult<Vec<InvoiceItem>> {
        sqlx::query_as::<_, InvoiceItemRow>(
            r#"
            SELECT item_id, invoice_id, product_id, product_name, unit_price, quantity, subtotal
            FROM invoice_items
            WHERE invoice_id = ?
            ORDER BY item_id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(InvoiceItem::try_from)
        .collect()
    }

    /// Reads an invoice together with its lines.
    ///
    /// # Arguments
    ///
    /// * `invoice_id` - Invoice to load
    ///
    /// # Returns
    ///
    /// The header and every recorded line, as committed. Catalog edits
    /// made after the sale are not reflected.
    ///
    /// # Errors
    ///
    /// `NotFound` if the invoice does not exist.
    #[instrument(skip(self))]
    pub async fn detail(&self, invoice_id: i64) -> StoreResult<InvoiceDetail> {
        let invoice = self.get(invoice_id).await?;
        let items = self.items(invoice_id).await?;
        Ok(InvoiceDetail { invoice, items })
    }
}
