//! Sample shopping carts: one value-based, one event-sourced, sharing the
//! same command surface and domain types. The entity id is the user id.

pub mod eventsourced;
pub mod value;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<LineItem>,
}

impl Cart {
    /// Add a quantity of a product, merging with an existing line item.
    pub fn add(&mut self, product_id: &str, name: &str, quantity: i32) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity += quantity,
            None => self.items.push(LineItem {
                product_id: product_id.to_string(),
                name: name.to_string(),
                quantity,
            }),
        }
    }

    /// Remove a product entirely. Returns false when it was not in the cart.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() < before
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLineItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveLineItem {
    pub product_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetShoppingCart {}
