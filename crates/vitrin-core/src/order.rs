//! # Order Types
//!
//! An order is a permanent snapshot created at checkout confirmation: its
//! lines and totals are frozen then and never recomputed. Status is the only
//! field that moves afterwards.
//!
//! ## Totals Assembly
//! ```text
//! subtotal      = Σ line quantity × unit price        (reporting currency)
//! discount      = order-level promotion outcome
//! tax           = tax-rate bps of (subtotal - discount)
//! shipping      = flat fee, waived above the free-shipping threshold
//! total         = (subtotal - discount) + tax + shipping
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::CurrencyCode;
use crate::money::Money;
use crate::promotion::PromotionOutcome;

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created but payment not yet confirmed.
    Pending,
    /// Payment confirmed.
    Paid,
    /// Cancelled before fulfilment.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order with frozen totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,

    /// Σ line totals, frozen at creation.
    pub subtotal_cents: i64,
    /// Order-level promotion discount, frozen at creation.
    pub discount_cents: i64,
    /// Tax on the discounted subtotal, frozen at creation.
    pub tax_cents: i64,
    /// Shipping fee, frozen at creation.
    pub shipping_cents: i64,
    /// Final payable amount, frozen at creation.
    pub total_cents: i64,

    /// Reporting currency all amounts are denominated in.
    pub currency: CurrencyCode,

    /// Promotion code redeemed on this order, if any.
    pub promotion_code: Option<String>,

    /// Reference returned by the payment gateway.
    pub payment_reference: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the final payable amount as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item of a placed order.
///
/// Uses the snapshot pattern: name and unit price are copied from the cart
/// line at creation, preserving historical pricing integrity even when the
/// catalog changes later.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,

    /// 1-based position within the order; lines keep their cart order.
    pub line_no: i64,

    pub product_id: String,
    pub variant_id: Option<String>,

    /// Name at time of purchase (frozen).
    pub name_snapshot: String,

    /// Units purchased.
    pub quantity: i64,

    /// Unit price in reporting-currency minor units at time of purchase (frozen).
    pub unit_price_cents: i64,

    /// quantity × unit price (frozen).
    pub line_total_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// The frozen monetary summary of an order, assembled once at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Assembles order totals from the resolved pieces.
    ///
    /// Tax applies to the discounted subtotal; shipping is added after tax.
    pub fn compute(
        subtotal: Money,
        promotion: PromotionOutcome,
        tax_rate_bps: i64,
        shipping: Money,
    ) -> Self {
        let discounted = promotion.total;
        let tax = discounted.percentage(tax_rate_bps);

        OrderTotals {
            subtotal,
            discount: promotion.discount,
            tax,
            shipping,
            total: discounted + tax + shipping,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
