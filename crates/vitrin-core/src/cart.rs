//! # Cart & Line-Item Aggregation
//!
//! The transient, user-scoped cart: snapshot lines plus the subtotal
//! aggregator.
//!
//! ## Price Snapshots
//! A line's unit price is captured in the **reporting currency** at the
//! moment it is added (after rate and product-sale resolution). The cart
//! never converts currencies itself; re-pricing a live line happens by
//! re-fetching and calling [`Cart::reprice`]. Once an order is placed the
//! snapshot becomes immutable on the order line.
//!
//! ## Invariants
//! - Lines are unique by (product_id, variant_id); adding again merges
//! - Quantity ≥ 1 (setting it to 0 removes the line)
//! - At most [`crate::MAX_CART_LINES`] lines
//! - At most [`crate::MAX_LINE_QUANTITY`] units per line

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Product ID (UUID).
    pub product_id: String,

    /// Variant ID, when a specific variant was chosen.
    pub variant_id: Option<String>,

    /// Product/variant name at time of adding (frozen).
    pub name: String,

    /// Unit price in reporting-currency minor units at time of adding.
    pub unit_price_cents: i64,

    /// Units of this line; always ≥ 1.
    pub quantity: i64,

    /// When this line was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total: quantity × unit price.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    fn matches(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart: a transient aggregate scoped to one user/session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    /// Lines in the cart.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a line or merges quantity into an existing one.
    ///
    /// `unit_price` must already be resolved into the reporting currency.
    pub fn add_line(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
        name: &str,
        unit_price: Money,
        quantity: i64,
    ) -> Result<(), CoreError> {
        if quantity <= 0 || quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, variant_id))
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            product_id: product_id.to_string(),
            variant_id: variant_id.map(str::to_string),
            name: name.to_string(),
            unit_price_cents: unit_price.cents(),
            quantity,
            added_at: Utc::now(),
        });
        Ok(())
    }

    /// Updates the quantity of a line.
    ///
    /// ## Behavior
    /// - quantity 0 removes the line
    /// - unknown line → [`CoreError::LineNotInCart`]
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> Result<(), CoreError> {
        if quantity == 0 {
            return self.remove_line(product_id, variant_id);
        }

        if quantity < 0 || quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, variant_id))
        {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotInCart {
                product_id: product_id.to_string(),
            }),
        }
    }

    /// Replaces a live line's unit-price snapshot after a re-fetch.
    pub fn reprice(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
        unit_price: Money,
    ) -> Result<(), CoreError> {
        match self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, variant_id))
        {
            Some(line) => {
                line.unit_price_cents = unit_price.cents();
                Ok(())
            }
            None => Err(CoreError::LineNotInCart {
                product_id: product_id.to_string(),
            }),
        }
    }

    /// Removes a line from the cart.
    pub fn remove_line(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> Result<(), CoreError> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, variant_id));

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotInCart {
                product_id: product_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Returns the number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Aggregates the subtotal: Σ quantity × unit price.
    ///
    /// All unit prices are already in the reporting currency, so this is
    /// pure integer summation; an empty cart yields zero.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.line_total())
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
