use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::models::{Customer, CustomerForm};
use crate::repository::like_pattern;

/// CRUD over the `customers` table.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer and returns its id.
    ///
    /// Fails with `Validation` for an empty name and `Constraint` when the
    /// phone number is already taken.
    #[instrument(skip(self))]
    pub async fn create(&self, form: &CustomerForm) -> StoreResult<i64> {
        let form = form.normalized()?;

        let result = sqlx::query("INSERT INTO customers (name, phone, address) VALUES (?, ?, ?)")
            .bind(&form.name)
            .bind(&form.phone)
            .bind(&form.address)
            .execute(&self.pool)
            .await?;

        let customer_id = result.last_insert_rowid();
        info!(customer_id, name = %form.name, "Customer created");
        Ok(customer_id)
    }

    /// Reads one customer.
    ///
    /// # Errors
    ///
    /// `NotFound` if no customer has this id.
    pub async fn get(&self, customer_id: i64) -> StoreResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "SELECT customer_id, name, phone, address FROM customers WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("customer", customer_id))
    }

    /// Whether a customer with this id is on file.
    pub async fn exists(&self, customer_id: i64) -> StoreResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM customers WHERE customer_id = ?")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// All customers ordered by name.
    pub async fn list(&self) -> StoreResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT customer_id, name, phone, address FROM customers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    /// Case-insensitive substring match on name or phone.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> StoreResult<Vec<Customer>> {
        if term.trim().is_empty() {
            return self.list().await;
        }

        let pattern = like_pattern(term.trim());
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, phone, address
            FROM customers
            WHERE name LIKE ? ESCAPE '\' OR phone LIKE ? ESCAPE '\'
            ORDER BY name
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(matches = customers.len(), "Customer search finished");
        Ok(customers)
    }

    /// Replaces a customer's details.
    ///
    /// # Arguments
    ///
    /// * `customer_id` - Customer to update
    /// * `form` - New name, phone and address; validated like on create
    ///
    /// # Returns
    ///
    /// The id of the updated customer.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name
    /// - `NotFound` if the customer does not exist
    /// - `Constraint` if the phone belongs to another customer
    #[instrument(skip(self))]
    pub async fn update(&self, customer_id: i64, form: &CustomerForm) -> StoreResult<i64> {
        let form = form.normalized()?;

        let result = sqlx::query(
            "UPDATE customers SET name = ?, phone = ?, address = ? WHERE customer_id = ?",
        )
        .bind(&form.name)
        .bind(&form.phone)
        .bind(&form.address)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", customer_id));
        }

        info!(customer_id, "Customer updated");
        Ok(customer_id)
    }

    /// Deletes a customer.
    ///
    /// # Errors
    ///
    /// - `Constraint` while any invoice references the customer
    /// - `NotFound` if the customer does not exist
    #[instrument(skip(self))]
    pub async fn delete(&self, customer_id: i64) -> StoreResult<i64> {
        let invoices: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE customer_id = ?")
                .bind(customer_id)
                .fetch_one(&self.pool)
                .await?;
        if invoices > 0 {
            return Err(StoreError::Constraint(format!(
                "customer {} is referenced by {} invoice(s)",
                customer_id, invoices
            )));
        }

        let result = sqlx::query("DELETE FROM customers WHERE customer_id = ?")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", customer_id));
        }

        info!(customer_id, "Customer deleted");
        Ok(customer_id)
    }
}
