//! # Discount Resolution
//!
//! A discount descriptor attaches either to a product (product-level sale)
//! or to a promotion (order-level coupon/campaign). The descriptor only
//! applies while the current time sits inside its validity window; outside
//! the window it is a no-op, not an error.
//!
//! Resolution is deterministic for a given `now`: callers pass the clock in,
//! this module never reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Discount Kind
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is basis points off (1500 = 15%).
    Percentage,
    /// `value` is a fixed amount off, in minor units.
    FixedAmount,
}

// =============================================================================
// Discount
// =============================================================================

/// A discount descriptor with an optional validity window.
///
/// ## Invariants
/// - `value` is positive
/// - `Percentage` value is at most 10000 bps (100%)
/// - when both bounds are present, `starts_at <= ends_at`
///
/// Enforced by [`Discount::validate`], called on every admin write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    /// Interpretation of `value`.
    pub kind: DiscountKind,

    /// Basis points for `Percentage`, minor units for `FixedAmount`.
    pub value: i64,

    /// Discount is inactive before this instant (open if absent).
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    /// Discount is inactive after this instant (open if absent).
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// Creates a validated discount.
    pub fn new(
        kind: DiscountKind,
        value: i64,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let discount = Discount {
            kind,
            value,
            starts_at,
            ends_at,
        };
        discount.validate()?;
        Ok(discount)
    }

    /// Checks the descriptor invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.value <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "discount value".to_string(),
            });
        }

        if self.kind == DiscountKind::Percentage && self.value > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "discount percentage".to_string(),
                min: 1,
                max: 10_000,
            });
        }

        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if starts > ends {
                return Err(ValidationError::InvalidWindow {
                    field: "discount".to_string(),
                });
            }
        }

        Ok(())
    }

    /// True if `now` falls inside the validity window.
    ///
    /// Bounds are inclusive; an absent bound leaves that side open.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if let Some(starts) = self.starts_at {
            if now < starts {
                return false;
            }
        }
        if let Some(ends) = self.ends_at {
            if now > ends {
                return false;
            }
        }
        true
    }

    /// Computes the amount this discount takes off `base` when active.
    ///
    /// Not clamped to `base`; order-level caps are the promotion
    /// resolver's concern.
    pub fn amount_off(&self, base: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => base.percentage(self.value),
            DiscountKind::FixedAmount => Money::from_cents(self.value),
        }
    }

    /// Resolves the effective price of `base` at `now`.
    ///
    /// ## Behavior
    /// - inactive window → `base` unchanged
    /// - percentage → `base - base × value/10000`
    /// - fixed amount → `base - value`, floored at zero (a sale must never
    ///   push a price negative)
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use vitrin_core::discount::{Discount, DiscountKind};
    /// use vitrin_core::money::Money;
    ///
    /// let sale = Discount::new(DiscountKind::Percentage, 2000, None, None).unwrap();
    /// let price = sale.effective_price(Money::from_cents(10_000), Utc::now());
    /// assert_eq!(price, Money::from_cents(8_000)); // 20% off 100.00
    /// ```
    pub fn effective_price(&self, base: Money, now: DateTime<Utc>) -> Money {
        if !self.is_active(now) {
            return base;
        }

        (base - self.amount_off(base)).floor_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
