//! In-memory order cart.
//!
//! One cart per open order-entry view, owned by that view's session; never a
//! process-wide singleton. One line per distinct menu item: repeated
//! selection increments the quantity instead of adding a duplicate line, and
//! a quantity driven to zero removes the line outright. Purely in-memory;
//! every mutation is followed by a pricing recompute in the caller.

use serde::{Deserialize, Serialize};

use crate::menu::MenuItem;
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub is_deal: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    // Insertion order is display order, so a Vec rather than a map.
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, menu_item_id: i64) -> Option<usize> {
        self.lines.iter().position(|l| l.menu_item_id == menu_item_id)
    }

    /// Add one of `item`, or bump the existing line's quantity.
    pub fn add_or_increment(&mut self, item: &MenuItem) {
        if let Some(idx) = self.position(item.id) {
            self.lines[idx].quantity += 1;
            return;
        }
        self.lines.push(CartLine {
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: 1,
            is_deal: item.is_deal,
        });
    }

    /// Bump an existing line. No-op when the item is not in the cart.
    pub fn increment(&mut self, menu_item_id: i64) {
        if let Some(idx) = self.position(menu_item_id) {
            self.lines[idx].quantity += 1;
        }
    }

    /// Lower an existing line by one; the line is removed at zero.
    /// No-op when the item is not in the cart.
    pub fn decrement(&mut self, menu_item_id: i64) {
        if let Some(idx) = self.position(menu_item_id) {
            if self.lines[idx].quantity > 1 {
                self.lines[idx].quantity -= 1;
            } else {
                self.lines.remove(idx);
            }
        }
    }

    /// Set a line's quantity. Zero removes the line; an absent id is a no-op.
    pub fn set_quantity(&mut self, menu_item_id: i64, quantity: u32) {
        if let Some(idx) = self.position(menu_item_id) {
            if quantity == 0 {
                self.lines.remove(idx);
            } else {
                self.lines[idx].quantity = quantity;
            }
        }
    }

    pub fn remove(&mut self, menu_item_id: i64) {
        if let Some(idx) = self.position(menu_item_id) {
            self.lines.remove(idx);
        }
    }

    /// Empty the cart (after save, or when the view is cancelled).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total piece count across top-level lines (deal components excluded).
    pub fn total_pieces(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
