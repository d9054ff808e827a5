use chrono::{Local, NaiveDateTime};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{error, info, instrument, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::{date_to_db, money_to_db};
use crate::repository::CustomerRepository;
use crate::sales::cart::Cart;

/// Owns the two multi-table writes of the system: committing a cart as an
/// invoice and deleting an invoice.
///
/// Each runs inside one SQLite transaction. Either every row and stock
/// change of the operation is applied, or none is.
#[derive(Debug, Clone)]
pub struct InvoiceManager {
    /// SQLite connection pool
    pool: SqlitePool,
}

impl InvoiceManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Commits `cart` as a new invoice for `customer_id` dated now.
    ///
    /// # Errors
    ///
    /// - `Validation` if the cart is empty or the customer does not exist;
    ///   nothing is written.
    /// - `Commit` if any write fails, including a stock shortfall found
    ///   inside the transaction. Everything is rolled back and the cart is
    ///   kept for a retry.
    ///
    /// On success the cart is cleared and the new invoice id returned.
    pub async fn commit(&self, customer_id: i64, cart: &mut Cart) -> StoreResult<i64> {
        self.commit_at(customer_id, cart, Local::now().naive_local())
            .await
    }

    /// [`commit`](Self::commit) with an explicit invoice timestamp.
    #[instrument(skip(self, cart), fields(lines = cart.len()))]
    pub async fn commit_at(
        &self,
        customer_id: i64,
        cart: &mut Cart,
        date: NaiveDateTime,
    ) -> StoreResult<i64> {
        if cart.is_empty() {
            return Err(StoreError::validation("cart is empty"));
        }
        if !CustomerRepository::new(self.pool.clone())
            .exists(customer_id)
            .await?
        {
            return Err(StoreError::validation(format!(
                "customer {} does not exist",
                customer_id
            )));
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::commit)?;

        match write_invoice(&mut tx, customer_id, cart, date).await {
            Ok(invoice_id) => {
                tx.commit().await.map_err(StoreError::commit)?;
                info!(
                    invoice_id,
                    customer_id,
                    total = %cart.total(),
                    "Invoice committed"
                );
                cart.clear();
                Ok(invoice_id)
            }
            Err(e) => {
                error!(customer_id, "Invoice commit failed, rolling back: {}", e);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Explicit rollback failed: {}", rollback_err);
                }
                Err(StoreError::commit(e))
            }
        }
    }

    /// Deletes an invoice and puts its quantities back into stock.
    ///
    /// Stock is restored by recorded quantity regardless of any catalog
    /// edits since the sale. Line items go with the invoice by cascade.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the invoice does not exist.
    /// - `Commit` if any write fails; nothing is restored or deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, invoice_id: i64) -> StoreResult<()> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT invoice_id FROM invoices WHERE invoice_id = ?")
                .bind(invoice_id)
                .fetch_optional(&self.pool)
                .await?;
        if found.is_none() {
            return Err(StoreError::not_found("invoice", invoice_id));
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::commit)?;

        match remove_invoice(&mut tx, invoice_id).await {
            Ok(restored) => {
                tx.commit().await.map_err(StoreError::commit)?;
                info!(invoice_id, restored_lines = restored, "Invoice deleted, stock restored");
                Ok(())
            }
            Err(e) => {
                error!(invoice_id, "Invoice delete failed, rolling back: {}", e);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Explicit rollback failed: {}", rollback_err);
                }
                Err(StoreError::commit(e))
            }
        }
    }
}

/// Header, lines, and stock decrements for one invoice.
async fn write_invoice(
    tx: &mut Transaction<'_, Sqlite>,
    customer_id: i64,
    cart: &Cart,
    date: NaiveDateTime,
) -> StoreResult<i64> {
    let invoice_id = sqlx::query(
        "INSERT INTO invoices (customer_id, date, total_amount) VALUES (?, ?, ?)",
    )
    .bind(customer_id)
    .bind(date_to_db(date))
    .bind(money_to_db(cart.total())?)
    .execute(&mut **tx)
    .await?
    .last_insert_rowid();

    for entry in cart.entries() {
        sqlx::query(
            r#"
            INSERT INTO invoice_items
                (invoice_id, product_id, product_name, unit_price, quantity, subtotal)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice_id)
        .bind(entry.product_id)
        .bind(&entry.name)
        .bind(money_to_db(entry.unit_price)?)
        .bind(entry.quantity)
        .bind(money_to_db(entry.subtotal())?)
        .execute(&mut **tx)
        .await?;

        // Stock is re-checked here rather than trusting the cart's read.
        let decremented = sqlx::query(
            "UPDATE products SET stock = stock - ? WHERE product_id = ? AND stock >= ?",
        )
        .bind(entry.quantity)
        .bind(entry.product_id)
        .bind(entry.quantity)
        .execute(&mut **tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(StoreError::validation(format!(
                "insufficient stock for {} at commit time",
                entry.name
            )));
        }
    }

    Ok(invoice_id)
}

/// Restores stock for every line, then deletes the invoice. Returns the
/// number of lines restored.
async fn remove_invoice(tx: &mut Transaction<'_, Sqlite>, invoice_id: i64) -> StoreResult<usize> {
    let lines: Vec<(i64, i64)> =
        sqlx::query_as("SELECT product_id, quantity FROM invoice_items WHERE invoice_id = ?")
            .bind(invoice_id)
            .fetch_all(&mut **tx)
            .await?;

    for (product_id, quantity) in &lines {
        let restored = sqlx::query("UPDATE products SET stock = stock + ? WHERE product_id = ?")
            .bind(quantity)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        if restored.rows_affected() == 0 {
            return Err(StoreError::not_found("product", *product_id));
        }
    }

    let deleted = sqlx::query("DELETE FROM invoices WHERE invoice_id = ?")
        .bind(invoice_id)
        .execute(&mut **tx)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(StoreError::not_found("invoice", invoice_id));
    }

    Ok(lines.len())
}
