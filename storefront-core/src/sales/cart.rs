use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::repository::ProductRepository;

/// One staged cart line.
///
/// Name and price are snapshots taken the first time the product was
/// added; they are what the invoice line will record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

impl CartEntry {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// In-memory staging area for a not-yet-committed invoice.
///
/// Entries are keyed and iterated by product id. Nothing here touches the
/// store except the fresh stock read in [`Cart::add`].
#[derive(Debug, Clone, Default)]
pub struct Cart {
    entries: BTreeMap<i64, CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `quantity` units of a product, accumulating onto an existing
    /// line.
    ///
    /// Stock is read from the store on every call and the accumulated
    /// quantity must not exceed it. On any error the cart is unchanged.
    pub async fn add(
        &mut self,
        products: &ProductRepository,
        product_id: i64,
        quantity: i64,
    ) -> StoreResult<&CartEntry> {
        if quantity <= 0 {
            return Err(StoreError::validation("quantity must be a positive integer"));
        }

        let product = products.get(product_id).await?;
        let staged = self.entries.get(&product_id).map_or(0, |e| e.quantity);
        let requested = staged
            .checked_add(quantity)
            .ok_or_else(|| StoreError::validation("quantity is too large"))?;

        if requested > product.stock {
            warn!(
                product_id,
                requested,
                stock = product.stock,
                "Rejected cart add: insufficient stock"
            );
            return Err(StoreError::validation(format!(
                "insufficient stock for {}: requested {}, available {}",
                product.name, requested, product.stock
            )));
        }

        let entry = self.entries.entry(product_id).or_insert_with(|| CartEntry {
            product_id,
            name: product.name,
            unit_price: product.price,
            quantity: 0,
        });
        entry.quantity = requested;

        debug!(product_id, quantity = entry.quantity, "Cart line staged");
        Ok(entry)
    }

    /// Removes a line. Absent products are a no-op.
    pub fn remove(&mut self, product_id: i64) -> Option<CartEntry> {
        self.entries.remove(&product_id)
    }

    /// Sum of unit price snapshot × quantity; zero when empty.
    pub fn total(&self) -> Decimal {
        self.entries.values().map(CartEntry::subtotal).sum()
    }

    /// Current lines in product-id order. Each call starts a new pass.
    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> + '_ {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializable view of the cart for the presentation shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub entries: Vec<CartLineView>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub entry: CartEntry,
    pub subtotal: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            entries: cart
                .entries()
                .map(|entry| CartLineView {
                    entry: entry.clone(),
                    subtotal: entry.subtotal(),
                })
                .collect(),
            total: cart.total(),
        }
    }
}
