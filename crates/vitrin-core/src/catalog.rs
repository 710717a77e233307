//! # Catalog Types
//!
//! Domain types for the product catalog and customers.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, email, promotion code) - human-readable
//!
//! ## Flat Struct Convention
//! Structs mirror their table rows (optional discount columns instead of a
//! nested struct) so the persistence layer can map them directly; helper
//! methods assemble the richer core types ([`Money`], [`Discount`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::CurrencyCode;
use crate::discount::{Discount, DiscountKind};
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available in the storefront.
///
/// The stored price is denominated in `currency`; it is resolved into the
/// reporting currency at display/checkout time. An optional product-level
/// sale (the `discount_*` columns) applies before order-level promotions.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown in listings and on order lines.
    pub name: String,

    /// Optional description for the detail page.
    pub description: Option<String>,

    /// Listed price in minor units of `currency`.
    pub price_cents: i64,

    /// Currency the listed price is denominated in.
    pub currency: CurrencyCode,

    /// Product-level sale: interpretation of `discount_value`.
    pub discount_kind: Option<DiscountKind>,

    /// Product-level sale: bps or minor units, per `discount_kind`.
    pub discount_value: Option<i64>,

    /// Product-level sale window start.
    #[ts(as = "Option<String>")]
    pub discount_starts_at: Option<DateTime<Utc>>,

    /// Product-level sale window end.
    #[ts(as = "Option<String>")]
    pub discount_ends_at: Option<DateTime<Utc>>,

    /// Whether the product is visible in the storefront (soft delete).
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the listed price as Money (still in `currency`).
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the product-level sale, if one is configured.
    pub fn discount(&self) -> Option<Discount> {
        match (self.discount_kind, self.discount_value) {
            (Some(kind), Some(value)) => Some(Discount {
                kind,
                value,
                starts_at: self.discount_starts_at,
                ends_at: self.discount_ends_at,
            }),
            _ => None,
        }
    }

    /// Listed price with any active product-level sale applied.
    ///
    /// Still denominated in `currency`; currency conversion happens after.
    pub fn effective_price(&self, now: DateTime<Utc>) -> Money {
        match self.discount() {
            Some(discount) => discount.effective_price(self.price(), now),
            None => self.price(),
        }
    }
}

// =============================================================================
// Product Variant
// =============================================================================

/// A purchasable variant of a product (size, color, ...).
///
/// A variant may override the product's listed price; it never overrides
/// the currency or the product-level sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductVariant {
    pub id: String,

    /// Product this variant belongs to.
    pub product_id: String,

    /// Variant label ("M / Red", "500ml", ...).
    pub name: String,

    /// Price override in minor units of the product's currency, if any.
    pub price_cents: Option<i64>,

    /// Units on hand.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ProductVariant {
    /// The variant's listed price: its override, or the product's price.
    pub fn listed_price(&self, product: &Product) -> Money {
        match self.price_cents {
            Some(cents) => Money::from_cents(cents),
            None => product.price(),
        }
    }

    /// Listed price with the product-level sale applied.
    pub fn effective_price(&self, product: &Product, now: DateTime<Utc>) -> Money {
        match product.discount() {
            Some(discount) => discount.effective_price(self.listed_price(product), now),
            None => self.listed_price(product),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A storefront customer.
///
/// Identity/auth lives with the external identity provider; this record
/// only carries what orders need.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,

    /// Business identifier; unique.
    pub email: String,

    pub full_name: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
