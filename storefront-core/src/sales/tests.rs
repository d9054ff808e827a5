//! Store-level properties of invoice commit and delete.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::db::memory_pool;
use crate::error::StoreError;
use crate::models::{CustomerForm, ProductForm};
use crate::repository::{CustomerRepository, InvoiceRepository, ProductRepository};
use crate::sales::{Cart, InvoiceManager};

struct Shop {
    pool: SqlitePool,
    customers: CustomerRepository,
    products: ProductRepository,
    invoices: InvoiceRepository,
    manager: InvoiceManager,
}

impl Shop {
    async fn new() -> Self {
        let pool = memory_pool().await;
        Shop {
            customers: CustomerRepository::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            manager: InvoiceManager::new(pool.clone()),
            pool,
        }
    }

    async fn customer(&self, name: &str) -> i64 {
        self.customers
            .create(&CustomerForm {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .expect("Should create customer")
    }

    async fn product(&self, name: &str, price: i64, stock: i64) -> i64 {
        self.products
            .create(&ProductForm {
                name: name.to_string(),
                price: Decimal::new(price, 0),
                stock,
            })
            .await
            .expect("Should create product")
    }

    async fn stock(&self, product_id: i64) -> i64 {
        self.products.get(product_id).await.expect("product").stock
    }

    async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Query should succeed")
    }
}

#[tokio::test]
async fn test_commit_conserves_stock_and_totals() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;
    let b = shop.product("B", 5, 2).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 3).await.unwrap();
    cart.add(&shop.products, b, 1).await.unwrap();

    let invoice_id = shop
        .manager
        .commit(customer, &mut cart)
        .await
        .expect("Commit should succeed");

    assert!(cart.is_empty(), "cart is cleared after commit");
    assert_eq!(shop.stock(a).await, 2);
    assert_eq!(shop.stock(b).await, 1);

    let detail = shop.invoices.detail(invoice_id).await.unwrap();
    assert_eq!(detail.invoice.total_amount, Decimal::new(35, 0));
    assert_eq!(detail.items.len(), 2);
    assert_eq!(shop.count("invoice_items").await, 2);
    assert_eq!(detail.items_total(), detail.invoice.total_amount);
    for item in &detail.items {
        assert_eq!(item.subtotal, item.unit_price * Decimal::from(item.quantity));
    }
}

#[tokio::test]
async fn test_fractional_prices_keep_total_equal_to_items() {
    let shop = Shop::new().await;
    let customer = shop.customer("Omid").await;
    let tea = shop
        .products
        .create(&ProductForm {
            name: "Tea".to_string(),
            price: Decimal::new(1999, 2),
            stock: 10,
        })
        .await
        .unwrap();
    let cup = shop
        .products
        .create(&ProductForm {
            name: "Cup".to_string(),
            price: Decimal::new(35, 1),
            stock: 10,
        })
        .await
        .unwrap();

    let mut cart = Cart::new();
    cart.add(&shop.products, tea, 3).await.unwrap();
    cart.add(&shop.products, cup, 7).await.unwrap();

    let invoice_id = shop.manager.commit(customer, &mut cart).await.unwrap();
    let detail = shop.invoices.detail(invoice_id).await.unwrap();

    assert_eq!(detail.invoice.total_amount, Decimal::new(8447, 2));
    assert_eq!(detail.items_total(), detail.invoice.total_amount);
}

#[tokio::test]
async fn test_commit_then_delete_restores_everything() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;
    let b = shop.product("B", 5, 2).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 5).await.unwrap();
    cart.add(&shop.products, b, 2).await.unwrap();
    let invoice_id = shop.manager.commit(customer, &mut cart).await.unwrap();
    assert_eq!(shop.stock(a).await, 0);

    shop.manager.delete(invoice_id).await.expect("Delete should succeed");

    assert_eq!(shop.stock(a).await, 5);
    assert_eq!(shop.stock(b).await, 2);
    assert_eq!(shop.count("invoices").await, 0);
    assert_eq!(shop.count("invoice_items").await, 0);
    assert!(matches!(
        shop.invoices.get(invoice_id).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_failed_second_line_rolls_back_whole_commit() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;
    let b = shop.product("B", 5, 2).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 3).await.unwrap();
    cart.add(&shop.products, b, 1).await.unwrap();

    // B disappears after staging, so its line insert hits the foreign key.
    shop.products.delete(b).await.unwrap();

    let result = shop.manager.commit(customer, &mut cart).await;
    match result {
        Err(StoreError::Commit(cause)) => {
            assert!(matches!(*cause, StoreError::Constraint(_)), "cause: {}", cause)
        }
        other => panic!("expected commit error, got {:?}", other),
    }

    assert_eq!(shop.count("invoices").await, 0);
    assert_eq!(shop.count("invoice_items").await, 0);
    assert_eq!(shop.stock(a).await, 5, "first line's decrement was rolled back");
    assert_eq!(cart.len(), 2, "cart survives a failed commit");
}

#[tokio::test]
async fn test_commit_rechecks_stock_inside_transaction() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;
    let b = shop.product("B", 5, 2).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 1).await.unwrap();
    cart.add(&shop.products, b, 2).await.unwrap();

    // Stock for B drops below the staged quantity after the cart's read.
    shop.products
        .update(
            b,
            &ProductForm {
                name: "B".to_string(),
                price: Decimal::new(5, 0),
                stock: 1,
            },
        )
        .await
        .unwrap();

    let result = shop.manager.commit(customer, &mut cart).await;
    assert!(matches!(result, Err(StoreError::Commit(_))));
    assert_eq!(shop.stock(a).await, 5);
    assert_eq!(shop.stock(b).await, 1);
    assert_eq!(shop.count("invoices").await, 0);
}

#[tokio::test]
async fn test_commit_validates_before_touching_store() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;

    let mut empty = Cart::new();
    assert!(matches!(
        shop.manager.commit(customer, &mut empty).await,
        Err(StoreError::Validation(_))
    ));

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 1).await.unwrap();
    assert!(matches!(
        shop.manager.commit(customer + 100, &mut cart).await,
        Err(StoreError::Validation(_))
    ));
    assert_eq!(cart.len(), 1);
    assert_eq!(shop.stock(a).await, 5);
    assert_eq!(shop.count("invoices").await, 0);
}

#[tokio::test]
async fn test_price_change_does_not_rewrite_history() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 2).await.unwrap();
    let invoice_id = shop.manager.commit(customer, &mut cart).await.unwrap();

    shop.products
        .update(
            a,
            &ProductForm {
                name: "A (new label)".to_string(),
                price: Decimal::new(99, 0),
                stock: 3,
            },
        )
        .await
        .unwrap();

    let detail = shop.invoices.detail(invoice_id).await.unwrap();
    assert_eq!(detail.items[0].unit_price, Decimal::new(10, 0));
    assert_eq!(detail.items[0].product_name, "A");
    assert_eq!(detail.invoice.total_amount, Decimal::new(20, 0));

    // Restoration goes by recorded quantity, not by the new catalog entry.
    shop.manager.delete(invoice_id).await.unwrap();
    assert_eq!(shop.stock(a).await, 5);
}

#[tokio::test]
async fn test_referenced_rows_cannot_be_deleted() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 1).await.unwrap();
    let invoice_id = shop.manager.commit(customer, &mut cart).await.unwrap();

    assert!(matches!(
        shop.customers.delete(customer).await,
        Err(StoreError::Constraint(_))
    ));
    assert!(matches!(
        shop.products.delete(a).await,
        Err(StoreError::Constraint(_))
    ));
    assert!(shop.customers.exists(customer).await.unwrap());

    shop.manager.delete(invoice_id).await.unwrap();
    shop.products.delete(a).await.expect("unreferenced product can go");
    shop.customers.delete(customer).await.expect("unreferenced customer can go");
}

#[tokio::test]
async fn test_delete_unknown_invoice() {
    let shop = Shop::new().await;
    assert!(matches!(
        shop.manager.delete(12).await,
        Err(StoreError::NotFound { entity: "invoice", id: 12 })
    ));
}

#[tokio::test]
async fn test_interleaved_commits_and_deletes_keep_stock_non_negative() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 4, 6).await;
    let b = shop.product("B", 7, 3).await;

    let mut committed = Vec::new();
    let plan: [(i64, i64); 4] = [(2, 1), (3, 2), (1, 0), (4, 3)];

    for (qa, qb) in plan {
        let mut cart = Cart::new();
        let staged_a = cart.add(&shop.products, a, qa).await.is_ok();
        if qb > 0 {
            let _ = cart.add(&shop.products, b, qb).await;
        }
        if !cart.is_empty() {
            if let Ok(id) = shop.manager.commit(customer, &mut cart).await {
                committed.push(id);
            }
        }
        assert!(shop.stock(a).await >= 0);
        assert!(shop.stock(b).await >= 0);

        // Free stock up every other round.
        if !staged_a && !committed.is_empty() {
            let id = committed.remove(0);
            shop.manager.delete(id).await.unwrap();
        }
    }

    for id in committed {
        shop.manager.delete(id).await.unwrap();
        assert!(shop.stock(a).await >= 0);
        assert!(shop.stock(b).await >= 0);
    }

    assert_eq!(shop.stock(a).await, 6);
    assert_eq!(shop.stock(b).await, 3);
    assert_eq!(shop.count("invoice_items").await, 0);
}

#[tokio::test]
async fn test_long_fraction_prices_keep_stored_total_equal_to_items() {
    let shop = Shop::new().await;
    let customer = shop.customer("Omid").await;
    let prices = [
        Decimal::new(2718281828, 9),
        Decimal::new(3141592653, 9),
        Decimal::new(1414213, 6),
        Decimal::new(99999, 3),
        Decimal::new(1234567891, 4),
        Decimal::new(5005, 3),
        Decimal::new(7777777, 5),
        Decimal::new(3333, 3),
    ];

    for round in 0..4_i64 {
        let mut cart = Cart::new();
        for (i, price) in prices.iter().enumerate() {
            let id = shop
                .products
                .create(&ProductForm {
                    name: format!("Item {}-{}", round, i),
                    price: *price,
                    stock: 1_000,
                })
                .await
                .unwrap();
            cart.add(&shop.products, id, 37 * (i as i64 + 1) + round)
                .await
                .unwrap();
        }

        let invoice_id = shop.manager.commit(customer, &mut cart).await.unwrap();
        let detail = shop.invoices.detail(invoice_id).await.unwrap();

        assert_eq!(detail.items_total(), detail.invoice.total_amount);
        for item in &detail.items {
            assert_eq!(item.unit_price, item.unit_price.round_dp(2));
            assert_eq!(item.subtotal, item.unit_price * Decimal::from(item.quantity));
        }
    }
}

#[tokio::test]
async fn test_failed_delete_restores_nothing() {
    let shop = Shop::new().await;
    let customer = shop.customer("Leila").await;
    let a = shop.product("A", 10, 5).await;
    let b = shop.product("B", 5, 4).await;

    let mut cart = Cart::new();
    cart.add(&shop.products, a, 3).await.unwrap();
    cart.add(&shop.products, b, 2).await.unwrap();
    let invoice_id = shop.manager.commit(customer, &mut cart).await.unwrap();

    // Stock restoration runs before the header delete, which this trigger refuses.
    sqlx::query(
        "CREATE TRIGGER keep_invoices BEFORE DELETE ON invoices BEGIN SELECT RAISE(ABORT, 'invoice is locked'); END",
    )
    .execute(&shop.pool)
    .await
    .unwrap();

    let result = shop.manager.delete(invoice_id).await;
    assert!(matches!(result, Err(StoreError::Commit(_))), "got {:?}", result);

    assert_eq!(shop.stock(a).await, 2);
    assert_eq!(shop.stock(b).await, 2);
    assert_eq!(shop.count("invoices").await, 1);
    assert_eq!(shop.count("invoice_items").await, 2);
    assert!(shop.invoices.get(invoice_id).await.is_ok());
}
