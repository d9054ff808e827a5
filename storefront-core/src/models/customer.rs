use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{StoreError, StoreResult};

/// Customer model mapping the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    /// Surrogate key
    pub customer_id: i64,

    /// Display name (never empty)
    pub name: String,

    /// Phone number, unique when present
    pub phone: Option<String>,

    /// Free-text postal address
    pub address: Option<String>,
}

/// Customer form submission, used for both create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerForm {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerForm {
    /// Trims the fields and rejects an empty name.
    ///
    /// Blank phone/address become `None`; storing an empty phone would
    /// collide with the `UNIQUE` constraint for every customer without one.
    pub fn normalized(&self) -> StoreResult<CustomerForm> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("customer name must not be empty"));
        }

        Ok(CustomerForm {
            name: name.to_string(),
            phone: non_blank(self.phone.as_deref()),
            address: non_blank(self.address.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
