use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::book::Book,
};

/// Most copies of one book a single cart line may hold
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// Shopping cart: book id mapped to requested quantity.
///
/// A cart belongs to one session and is never written to the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: BTreeMap<i64, i64>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` copies, merging with an existing line
    pub fn add(&mut self, book_id: i64, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            return Err(AppError::Validation("Quantity must be at least 1.".into()));
        }
        let merged = self.quantity(book_id).unwrap_or(0).saturating_add(quantity);
        check_line_quantity(merged)?;
        self.lines.insert(book_id, merged);
        Ok(())
    }

    pub fn remove(&mut self, book_id: i64) -> bool {
        self.lines.remove(&book_id).is_some()
    }

    /// Replace the quantity of an existing line; zero or less drops it.
    /// Returns false when the book is not in the cart.
    pub fn set_quantity(&mut self, book_id: i64, quantity: i64) -> Result<bool> {
        if !self.lines.contains_key(&book_id) {
            return Ok(false);
        }
        if quantity <= 0 {
            self.lines.remove(&book_id);
        } else {
            check_line_quantity(quantity)?;
            self.lines.insert(book_id, quantity);
        }
        Ok(true)
    }

    pub fn quantity(&self, book_id: i64) -> Option<i64> {
        self.lines.get(&book_id).copied()
    }

    /// Total number of units across all lines
    pub fn count(&self) -> i64 {
        self.lines
            .values()
            .fold(0i64, |total, quantity| total.saturating_add(*quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.lines.iter().map(|(id, qty)| (*id, *qty))
    }
}

/// A cart line priced against the current catalog
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub book: Book,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// The cart as displayed: priced lines plus any adjustments that were made
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_cents: i64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub book_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: i64,
}

fn default_quantity() -> i64 {
    1
}

fn check_line_quantity(quantity: i64) -> Result<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::Validation(format!(
            "At most {} copies of a book fit in one cart.",
            MAX_LINE_QUANTITY
        )));
    }
    Ok(())
}
