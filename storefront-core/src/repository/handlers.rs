use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::error::StoreResult;
use crate::models::{Customer, CustomerForm, Product, ProductForm};

/// Query string for the customer list.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    /// Substring of name or phone
    pub q: Option<String>,
}

/// Query string for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Substring of the name
    pub q: Option<String>,

    /// Only products with stock > 0
    #[serde(default)]
    pub in_stock: bool,
}

/// Customer list endpoint handler.
///
/// Handles GET requests to `/customers`. With `?q=` the list is narrowed
/// to customers whose name or phone contains the term.
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> StoreResult<Json<Vec<Customer>>> {
    let repo = state.customers();
    let customers = match query.q.as_deref() {
        Some(term) => repo.search(term).await?,
        None => repo.list().await?,
    };
    Ok(Json(customers))
}

/// Customer create endpoint handler.
///
/// Handles POST requests to `/customers` and answers `201` with the new
/// `customer_id`.
pub async fn create_customer(
    State(state): State<AppState>,
    Json(form): Json<CustomerForm>,
) -> StoreResult<(StatusCode, Json<Value>)> {
    let customer_id = state.customers().create(&form).await?;
    Ok((StatusCode::CREATED, Json(json!({ "customer_id": customer_id }))))
}

/// Customer detail endpoint handler.
///
/// Handles GET requests to `/customers/:id`.
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> StoreResult<Json<Customer>> {
    Ok(Json(state.customers().get(customer_id).await?))
}

/// Customer update endpoint handler.
///
/// Handles PUT requests to `/customers/:id` with a full customer form.
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Json(form): Json<CustomerForm>,
) -> StoreResult<Json<Value>> {
    state.customers().update(customer_id, &form).await?;
    Ok(Json(json!({ "customer_id": customer_id })))
}

/// Customer delete endpoint handler.
///
/// Handles DELETE requests to `/customers/:id`. Answers `409` while any
/// invoice still belongs to the customer.
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> StoreResult<StatusCode> {
    state.customers().delete(customer_id).await?;
    info!("Customer {} removed via API", customer_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Product list endpoint handler.
///
/// Handles GET requests to `/products`. `?q=` searches by name and
/// `?in_stock=true` keeps only products that can be sold.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> StoreResult<Json<Vec<Product>>> {
    let repo = state.products();
    let mut products = match query.q.as_deref() {
        Some(term) => repo.search(term).await?,
        None if query.in_stock => repo.list_in_stock().await?,
        None => repo.list().await?,
    };
    if query.in_stock {
        products.retain(|p| p.stock > 0);
    }
    Ok(Json(products))
}

/// Product create endpoint handler.
///
/// Handles POST requests to `/products` and answers `201` with the new
/// `product_id`.
pub async fn create_product(
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> StoreResult<(StatusCode, Json<Value>)> {
    let product_id = state.products().create(&form).await?;
    Ok((StatusCode::CREATED, Json(json!({ "product_id": product_id }))))
}

/// Product detail endpoint handler.
///
/// Handles GET requests to `/products/:id`.
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> StoreResult<Json<Product>> {
    Ok(Json(state.products().get(product_id).await?))
}

/// Product update endpoint handler.
///
/// Handles PUT requests to `/products/:id`. The price is rounded to cents.
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(form): Json<ProductForm>,
) -> StoreResult<Json<Value>> {
    state.products().update(product_id, &form).await?;
    Ok(Json(json!({ "product_id": product_id })))
}

/// Product delete endpoint handler.
///
/// Handles DELETE requests to `/products/:id`. Answers `409` while any
/// invoice line still records the product.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> StoreResult<StatusCode> {
    state.products().delete(product_id).await?;
    info!("Product {} removed via API", product_id);
    Ok(StatusCode::NO_CONTENT)
}
