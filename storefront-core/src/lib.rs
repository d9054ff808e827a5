//! Point-of-sale core: customers, catalog, carts, invoices and reports over
//! a local SQLite store.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;
pub mod repository;
pub mod sales;

pub use error::{StoreError, StoreResult};
