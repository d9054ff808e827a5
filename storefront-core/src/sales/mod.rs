pub mod cart;
pub mod handlers;
pub mod transaction;

#[cfg(test)]
mod tests;

pub use cart::{Cart, CartEntry, CartView};
pub use transaction::InvoiceManager;
