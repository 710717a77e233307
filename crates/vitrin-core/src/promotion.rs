//! # Order-Level Promotion Resolution
//!
//! Applies a single coupon or campaign to an aggregated cart subtotal.
//!
//! ## Resolution Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Promotion Resolution                                   │
//! │                                                                         │
//! │  subtotal (reporting currency)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  promotion active? inside window? ── no ──► { discount: 0, total }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal ≥ min_order? ─────────── no ──► { discount: 0, total }       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  percentage: bps share, capped at max_discount                         │
//! │  fixed:      value, capped at max_discount and at subtotal             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { discount, total = subtotal - discount (floored at 0) }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What this module does NOT do
//! - look up codes (unknown codes are a repository lookup failure, reported
//!   before this resolver runs)
//! - check or mutate usage counters (`has_uses_remaining` is a caller
//!   precondition; the increment is a transactional write in vitrin-db on
//!   order confirmation)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::{Discount, DiscountKind};
use crate::money::Money;

// =============================================================================
// Promotion Kind
// =============================================================================

/// Whether a promotion is a user-entered coupon or a storewide campaign.
///
/// Both share the same arithmetic; the storefront only differs in how the
/// code reaches checkout (typed in vs. auto-applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Code typed by the customer at checkout.
    Coupon,
    /// Storewide campaign applied automatically.
    Campaign,
}

// =============================================================================
// Promotion
// =============================================================================

/// A coupon or campaign configured in the admin back-office.
///
/// ## Invariants
/// - `usage_count <= usage_limit` when a limit is set (guarded by the
///   conditional increment in vitrin-db)
/// - the effective discount never exceeds `max_discount_cents`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Promotion {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Redemption code; unique, stored uppercase.
    pub code: String,

    /// Coupon or campaign.
    pub kind: PromotionKind,

    /// Interpretation of `discount_value`.
    pub discount_kind: DiscountKind,

    /// Basis points or minor units, per `discount_kind`.
    pub discount_value: i64,

    /// Validity window start (open if absent).
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    /// Validity window end (open if absent).
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    /// Minimum subtotal required before the promotion applies.
    pub min_order_cents: Option<i64>,

    /// Ceiling on the discount amount.
    pub max_discount_cents: Option<i64>,

    /// How many redemptions are allowed in total (unlimited if absent).
    pub usage_limit: Option<i64>,

    /// How many times the promotion has been redeemed.
    pub usage_count: i64,

    /// Admin kill-switch.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// The promotion's discount descriptor (carries the validity window).
    pub fn discount(&self) -> Discount {
        Discount {
            kind: self.discount_kind,
            value: self.discount_value,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }

    /// True while the kill-switch is on and `now` is inside the window.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.discount().is_active(now)
    }

    /// Caller precondition for redemption: the usage ceiling has room.
    ///
    /// The resolver itself never reads this; checkout checks it before
    /// computing amounts, and the persistence layer enforces it again with
    /// a guarded increment on order confirmation.
    pub fn has_uses_remaining(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.usage_count < limit,
            None => true,
        }
    }

    /// Resolves the promotion against an aggregated subtotal.
    ///
    /// Computes amounts only; no usage counters are touched.
    pub fn apply(&self, subtotal: Money, now: DateTime<Utc>) -> PromotionOutcome {
        if !self.is_redeemable(now) {
            return PromotionOutcome::zero(subtotal);
        }

        if let Some(min) = self.min_order_cents {
            if subtotal.cents() < min {
                return PromotionOutcome::zero(subtotal);
            }
        }

        let mut discount = match self.discount_kind {
            DiscountKind::Percentage => subtotal.percentage(self.discount_value),
            DiscountKind::FixedAmount => Money::from_cents(self.discount_value).min(subtotal),
        };

        if let Some(cap) = self.max_discount_cents {
            discount = discount.min(Money::from_cents(cap));
        }

        PromotionOutcome {
            discount,
            total: (subtotal - discount).floor_zero(),
        }
    }
}

// =============================================================================
// Promotion Outcome
// =============================================================================

/// The resolved order-level discount and final payable total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromotionOutcome {
    /// Amount taken off the subtotal.
    pub discount: Money,

    /// `subtotal - discount`, floored at zero.
    pub total: Money,
}

impl PromotionOutcome {
    /// No-discount outcome: the subtotal passes through unchanged.
    pub fn zero(subtotal: Money) -> Self {
        PromotionOutcome {
            discount: Money::zero(),
            total: subtotal,
        }
    }
}

/// Resolves an optional promotion against a subtotal.
///
/// `None` (no code entered, or lookup already failed and was reported)
/// yields the zero outcome.
pub fn apply_promotion(
    subtotal: Money,
    promotion: Option<&Promotion>,
    now: DateTime<Utc>,
) -> PromotionOutcome {
    match promotion {
        Some(promo) => promo.apply(subtotal, now),
        None => PromotionOutcome::zero(subtotal),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
    }

    fn promo(kind: DiscountKind, value: i64) -> Promotion {
        Promotion {
            id: "promo-1".to_string(),
            code: "SAVE".to_string(),
            kind: PromotionKind::Coupon,
            discount_kind: kind,
            discount_value: value,
            starts_at: None,
            ends_at: None,
            min_order_cents: None,
            max_discount_cents: None,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_none_promotion_passes_subtotal_through() {
        let outcome = apply_promotion(Money::from_cents(10_000), None, now());
        assert_eq!(outcome.discount, Money::zero());
        assert_eq!(outcome.total, Money::from_cents(10_000));
    }

    #[test]
    fn test_percentage_capped_at_max_discount() {
        // Subtotal 1000.00, 10% capped at 80.00 → discount 80.00, total 920.00
        let mut promo = promo(DiscountKind::Percentage, 1000);
        promo.max_discount_cents = Some(8_000);

        let outcome = promo.apply(Money::from_cents(100_000), now());
        assert_eq!(outcome.discount, Money::from_cents(8_000));
        assert_eq!(outcome.total, Money::from_cents(92_000));
    }

    #[test]
    fn test_percentage_uncapped() {
        let promo = promo(DiscountKind::Percentage, 1500);

        let outcome = promo.apply(Money::from_cents(325_000), now());
        assert_eq!(outcome.discount, Money::from_cents(48_750));
        assert_eq!(outcome.total, Money::from_cents(276_250)); // 2762.50
    }

    #[test]
    fn test_fixed_capped_at_subtotal() {
        // Subtotal 50.00, fixed 100.00 → discount 50.00, total 0
        let promo = promo(DiscountKind::FixedAmount, 10_000);

        let outcome = promo.apply(Money::from_cents(5_000), now());
        assert_eq!(outcome.discount, Money::from_cents(5_000));
        assert_eq!(outcome.total, Money::zero());
    }

    #[test]
    fn test_min_order_not_met_yields_zero() {
        let mut promo = promo(DiscountKind::Percentage, 1000);
        promo.min_order_cents = Some(20_000);

        let outcome = promo.apply(Money::from_cents(19_999), now());
        assert_eq!(outcome.discount, Money::zero());
        assert_eq!(outcome.total, Money::from_cents(19_999));

        let outcome = promo.apply(Money::from_cents(20_000), now());
        assert_eq!(outcome.discount, Money::from_cents(2_000));
    }

    #[test]
    fn test_outside_window_yields_zero() {
        let mut promo = promo(DiscountKind::Percentage, 1000);
        promo.ends_at = Some(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());

        let outcome = promo.apply(Money::from_cents(10_000), now());
        assert_eq!(outcome.discount, Money::zero());
        assert_eq!(outcome.total, Money::from_cents(10_000));
    }

    #[test]
    fn test_inactive_promotion_yields_zero() {
        let mut promo = promo(DiscountKind::Percentage, 1000);
        promo.is_active = false;

        let outcome = promo.apply(Money::from_cents(10_000), now());
        assert_eq!(outcome.discount, Money::zero());
    }

    #[test]
    fn test_fixed_respects_max_discount_cap() {
        let mut promo = promo(DiscountKind::FixedAmount, 5_000);
        promo.max_discount_cents = Some(3_000);

        let outcome = promo.apply(Money::from_cents(10_000), now());
        assert_eq!(outcome.discount, Money::from_cents(3_000));
    }

    #[test]
    fn test_has_uses_remaining() {
        let mut promo = promo(DiscountKind::Percentage, 1000);
        assert!(promo.has_uses_remaining()); // unlimited

        promo.usage_limit = Some(5);
        promo.usage_count = 4;
        assert!(promo.has_uses_remaining());

        promo.usage_count = 5;
        assert!(!promo.has_uses_remaining());
    }
}
