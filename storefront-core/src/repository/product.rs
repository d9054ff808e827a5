use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::models::product::ProductRow;
use crate::models::{money_to_db, Product, ProductForm};
use crate::repository::like_pattern;

const PRODUCT_COLUMNS: &str = "product_id, name, price, stock";

/// CRUD over the `products` catalog.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns its id. Duplicate names are a
    /// `Constraint` error.
    #[instrument(skip(self))]
    pub async fn create(&self, form: &ProductForm) -> StoreResult<i64> {
        let form = form.normalized()?;

        let result = sqlx::query("INSERT INTO products (name, price, stock) VALUES (?, ?, ?)")
            .bind(&form.name)
            .bind(money_to_db(form.price)?)
            .bind(form.stock)
            .execute(&self.pool)
            .await?;

        let product_id = result.last_insert_rowid();
        info!(product_id, name = %form.name, "Product created");
        Ok(product_id)
    }

    /// Reads the product as it is in the store right now.
    ///
    /// # Errors
    ///
    /// `NotFound` if no product has this id.
    pub async fn get(&self, product_id: i64) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE product_id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("product", product_id))?;

        Product::try_from(row)
    }

    /// Whole catalog ordered by name.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        self.fetch(&format!("SELECT {} FROM products ORDER BY name", PRODUCT_COLUMNS), None)
            .await
    }

    /// Products that can currently be sold (stock > 0).
    pub async fn list_in_stock(&self) -> StoreResult<Vec<Product>> {
        self.fetch(
            &format!(
                "SELECT {} FROM products WHERE stock > 0 ORDER BY name",
                PRODUCT_COLUMNS
            ),
            None,
        )
        .await
    }

    /// Case-insensitive substring match on the product name.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> StoreResult<Vec<Product>> {
        if term.trim().is_empty() {
            return self.list().await;
        }

        let products = self
            .fetch(
                &format!(
                    r"SELECT {} FROM products WHERE name LIKE ? ESCAPE '\' ORDER BY name",
                    PRODUCT_COLUMNS
                ),
                Some(like_pattern(term.trim())),
            )
            .await?;

        debug!(matches = products.len(), "Product search finished");
        Ok(products)
    }

    /// Replaces a product's name, price and stock.
    ///
    /// Invoices already recorded keep their own name and price copies.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name or negative price/stock
    /// - `NotFound` if the product does not exist
    /// - `Constraint` if the new name is taken
    #[instrument(skip(self))]
    pub async fn update(&self, product_id: i64, form: &ProductForm) -> StoreResult<i64> {
        let form = form.normalized()?;

        let result =
            sqlx::query("UPDATE products SET name = ?, price = ?, stock = ? WHERE product_id = ?")
                .bind(&form.name)
                .bind(money_to_db(form.price)?)
                .bind(form.stock)
                .bind(product_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product_id));
        }

        info!(product_id, "Product updated");
        Ok(product_id)
    }

    /// Deletes a product.
    ///
    /// # Errors
    ///
    /// - `Constraint` while any invoice line references the product
    /// - `NotFound` if the product does not exist
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: i64) -> StoreResult<i64> {
        let lines: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE product_id = ?")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;
        if lines > 0 {
            return Err(StoreError::Constraint(format!(
                "product {} is referenced by {} invoice line(s)",
                product_id, lines
            )));
        }

        let result = sqlx::query("DELETE FROM products WHERE product_id = ?")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product_id));
        }

        info!(product_id, "Product deleted");
        Ok(product_id)
    }

    async fn fetch(&self, sql: &str, pattern: Option<String>) -> StoreResult<Vec<Product>> {
        let mut query = sqlx::query_as::<_, ProductRow>(sql);
        if let Some(pattern) = pattern {
            query = query.bind(pattern);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }
}
