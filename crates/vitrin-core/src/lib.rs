//! # vitrin-core: Pure Pricing Logic for Vitrin
//!
//! This crate is the **heart** of the Vitrin storefront. It contains the
//! whole pricing resolution pipeline as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrin Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront / Admin SPA                          │   │
//! │  │    Listing ──► Detail ──► Cart ──► Checkout ──► Back-office    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed JSON                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vitrin-checkout                              │   │
//! │  │    context, policy, payment gateway, checkout orchestration    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrin-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐ │   │
//! │  │   │  money   │ │ currency │ │ discount │ │ cart / promotion │ │   │
//! │  │   │  Money   │ │ RateTable│ │ windows  │ │ aggregation      │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vitrin-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Pricing Pipeline
//!
//! Every price a customer sees flows through the same four steps:
//!
//! 1. [`currency::RateTable::resolve`] - stored price → reporting currency
//! 2. [`discount::Discount::effective_price`] - product-level sale window
//! 3. [`cart::Cart::subtotal`] - Σ quantity × effective unit price
//! 4. [`promotion::Promotion::apply`] - order-level coupon/campaign
//!
//! All four are synchronous and deterministic for a given `now`; the caller
//! fetches data first and passes everything in.
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, clock passed in
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: minor units (i64) everywhere, no floating point
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use vitrin_core::cart::Cart;
//! use vitrin_core::currency::{CurrencyCode, ExchangeRate, RateTable};
//! use vitrin_core::money::Money;
//!
//! let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
//! let table = RateTable::from_rates(
//!     CurrencyCode::new("TRY").unwrap(),
//!     date,
//!     &[ExchangeRate {
//!         currency: CurrencyCode::new("USD").unwrap(),
//!         rate_micros: 32_500_000, // 32.5
//!         effective_date: date,
//!     }],
//! );
//!
//! // A 100.00 USD product displays as 3250.00 TRY
//! let resolved = table.resolve(Money::from_cents(10_000), &CurrencyCode::new("USD").unwrap());
//! let mut cart = Cart::new();
//! cart.add_line("p1", None, "Keyboard", resolved.amount(), 1).unwrap();
//! assert_eq!(cart.subtotal(), Money::from_cents(325_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod currency;
pub mod discount;
pub mod error;
pub mod money;
pub mod order;
pub mod promotion;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vitrin_core::Money` instead of
// `use vitrin_core::money::Money`

pub use cart::{Cart, CartLine};
pub use catalog::{Customer, Product, ProductVariant};
pub use currency::{CurrencyCode, ExchangeRate, RateTable, ResolvedPrice, RATE_SCALE};
pub use discount::{Discount, DiscountKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{Order, OrderLine, OrderStatus, OrderTotals};
pub use promotion::{apply_promotion, Promotion, PromotionKind, PromotionOutcome};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps checkout payloads reasonable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

// =============================================================================
// Pipeline Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::cart::Cart;
    use crate::currency::{CurrencyCode, ExchangeRate, RateTable};
    use crate::discount::DiscountKind;
    use crate::money::Money;
    use crate::order::OrderTotals;
    use crate::promotion::{apply_promotion, Promotion, PromotionKind};

    /// The full storefront scenario: a 100 USD product, a 32.5 USD→TRY rate,
    /// and a storewide 15% campaign.
    #[test]
    fn test_listing_to_checkout_pipeline() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let usd = CurrencyCode::new("USD").unwrap();

        let table = RateTable::from_rates(
            CurrencyCode::new("TRY").unwrap(),
            today,
            &[ExchangeRate {
                currency: usd.clone(),
                rate_micros: 32_500_000,
                effective_date: today,
            }],
        );

        // Listing: 100.00 USD shows as 3250.00 TRY
        let resolved = table.resolve(Money::from_cents(10_000), &usd);
        assert!(resolved.is_converted());
        assert_eq!(resolved.amount(), Money::from_cents(325_000));

        // Cart: one unit
        let mut cart = Cart::new();
        cart.add_line("p1", None, "Mechanical Keyboard", resolved.amount(), 1)
            .unwrap();
        let subtotal = cart.subtotal();
        assert_eq!(subtotal, Money::from_cents(325_000));

        // Checkout: 15% campaign, no cap → 2762.50 TRY
        let campaign = Promotion {
            id: "c1".to_string(),
            code: "AUTUMN15".to_string(),
            kind: PromotionKind::Campaign,
            discount_kind: DiscountKind::Percentage,
            discount_value: 1500,
            starts_at: None,
            ends_at: None,
            min_order_cents: None,
            max_discount_cents: None,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let outcome = apply_promotion(subtotal, Some(&campaign), now);
        assert_eq!(outcome.total, Money::from_cents(276_250));

        // Order totals: no tax, no shipping in this scenario
        let totals = OrderTotals::compute(subtotal, outcome, 0, Money::zero());
        assert_eq!(totals.total, Money::from_cents(276_250));
        assert_eq!(totals.discount, Money::from_cents(48_750));
    }

    /// A missing rate is carried through as an inspectable unconverted
    /// amount; the cart still works, the UI decides how to warn.
    #[test]
    fn test_pipeline_with_missing_rate() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let table = RateTable::new(CurrencyCode::new("TRY").unwrap(), today);

        let resolved = table.resolve(Money::from_cents(10_000), &CurrencyCode::new("USD").unwrap());
        assert!(!resolved.is_converted());
        assert_eq!(resolved.amount(), Money::from_cents(10_000));
    }
}
