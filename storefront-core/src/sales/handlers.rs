use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::error::StoreResult;
use crate::models::{InvoiceDetail, InvoiceSummary};
use crate::sales::cart::CartView;

/// Body of `POST /cart/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCart {
    pub product_id: i64,
    pub quantity: i64,
}

/// Body of `POST /invoices`: commit the session cart for this customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInvoice {
    pub customer_id: i64,
}

/// Cart endpoint handler.
///
/// Handles GET requests to `/cart` with the staged lines and total.
pub async fn get_cart(State(state): State<AppState>) -> Json<CartView> {
    let cart = state.cart.lock().await;
    Json(CartView::from(&*cart))
}

/// Cart add endpoint handler.
///
/// Handles POST requests to `/cart/items`. Answers `422` when the
/// quantity is not positive or exceeds the product's stock.
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<AddToCart>,
) -> StoreResult<Json<CartView>> {
    let products = state.products();
    let mut cart = state.cart.lock().await;
    cart.add(&products, request.product_id, request.quantity)
        .await?;
    Ok(Json(CartView::from(&*cart)))
}

/// Cart line removal endpoint handler.
///
/// Handles DELETE requests to `/cart/items/:product_id`; removing an
/// absent line is not an error.
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Json<CartView> {
    let mut cart = state.cart.lock().await;
    cart.remove(product_id);
    Json(CartView::from(&*cart))
}

/// Cart clear endpoint handler.
///
/// Handles DELETE requests to `/cart`.
pub async fn clear_cart(State(state): State<AppState>) -> StatusCode {
    state.cart.lock().await.clear();
    StatusCode::NO_CONTENT
}

/// Invoice list endpoint handler.
///
/// Handles GET requests to `/invoices`, newest first.
pub async fn list_invoices(State(state): State<AppState>) -> StoreResult<Json<Vec<InvoiceSummary>>> {
    Ok(Json(state.invoices().list().await?))
}

/// Invoice commit endpoint handler.
///
/// Handles POST requests to `/invoices`: commits the session cart for the
/// given customer and answers `201` with the new `invoice_id`. A failed
/// commit leaves the cart as it was.
pub async fn commit_invoice(
    State(state): State<AppState>,
    Json(request): Json<CommitInvoice>,
) -> StoreResult<(StatusCode, Json<Value>)> {
    let manager = state.invoice_manager();
    let mut cart = state.cart.lock().await;
    let invoice_id = manager.commit(request.customer_id, &mut cart).await?;

    info!("Invoice {} committed via API", invoice_id);
    Ok((StatusCode::CREATED, Json(json!({ "invoice_id": invoice_id }))))
}

/// Invoice detail endpoint handler.
///
/// Handles GET requests to `/invoices/:id` with the header and its lines.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> StoreResult<Json<InvoiceDetail>> {
    Ok(Json(state.invoices().detail(invoice_id).await?))
}

/// Invoice delete endpoint handler.
///
/// Handles DELETE requests to `/invoices/:id` and puts the sold
/// quantities back into stock.
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> StoreResult<StatusCode> {
    state.invoice_manager().delete(invoice_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
