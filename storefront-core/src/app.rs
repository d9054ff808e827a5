use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::StoreError;
use crate::reports::{self, ReportEngine};
use crate::repository::{self, CustomerRepository, InvoiceRepository, ProductRepository};
use crate::sales::{self, Cart, InvoiceManager};

/// Application state shared with route handlers.
///
/// The store pool plus the single session cart of the local user.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub db: SqlitePool,

    /// Pending order being built by the presentation shell
    pub cart: Arc<Mutex<Cart>>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.db.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.db.clone())
    }

    pub fn invoice_manager(&self) -> InvoiceManager {
        InvoiceManager::new(self.db.clone())
    }

    pub fn reports(&self) -> ReportEngine {
        ReportEngine::new(self.db.clone())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Constraint(_) => StatusCode::CONFLICT,
            StoreError::Commit(_) | StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check endpoint.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "storefront-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Database health check endpoint.
///
/// Verifies that the store answers a trivial query.
async fn db_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!("Database health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

/// Creates the router the presentation shell talks to.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        // Catalog and customers
        .route(
            "/customers",
            get(repository::handlers::list_customers).post(repository::handlers::create_customer),
        )
        .route(
            "/customers/:id",
            get(repository::handlers::get_customer)
                .put(repository::handlers::update_customer)
                .delete(repository::handlers::delete_customer),
        )
        .route(
            "/products",
            get(repository::handlers::list_products).post(repository::handlers::create_product),
        )
        .route(
            "/products/:id",
            get(repository::handlers::get_product)
                .put(repository::handlers::update_product)
                .delete(repository::handlers::delete_product),
        )
        // Pending order
        .route(
            "/cart",
            get(sales::handlers::get_cart).delete(sales::handlers::clear_cart),
        )
        .route("/cart/items", post(sales::handlers::add_to_cart))
        .route(
            "/cart/items/:product_id",
            delete(sales::handlers::remove_from_cart),
        )
        // Invoices
        .route(
            "/invoices",
            get(sales::handlers::list_invoices).post(sales::handlers::commit_invoice),
        )
        .route(
            "/invoices/:id",
            get(sales::handlers::get_invoice).delete(sales::handlers::delete_invoice),
        )
        .route("/reports/:id", get(reports::handlers::run_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
