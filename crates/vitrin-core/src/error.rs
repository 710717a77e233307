//! # Error Types
//!
//! Domain-specific error types for vitrin-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrin-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrin-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  vitrin-checkout errors (separate crate)                               │
//! │  └── CheckoutError    - What the storefront sees                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → notification      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, limits)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a dismissible user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core pricing/promotion errors.
///
/// These errors represent business rule violations. They should be caught
/// by the orchestration layer and translated to user-friendly messages.
///
/// Note what is deliberately *not* an error: a missing exchange rate
/// (surfaced as [`crate::currency::ResolvedPrice::Unconverted`]) and a
/// promotion whose minimum order amount is not met (resolved to a zero
/// discount). Both are ordinary outcomes the UI warns about.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist in the catalog
    /// - Product was deactivated (soft delete)
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Promotion code does not exist.
    ///
    /// Lookup failures are reported before the resolver runs; the cart is
    /// left untouched and the user sees a rejection message.
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Promotion exists but is disabled or outside its validity window.
    #[error("Promotion {code} is not currently active")]
    PromotionInactive { code: String },

    /// Promotion has reached its usage ceiling.
    ///
    /// ## When This Occurs
    /// - `usage_count >= usage_limit` at redemption time
    ///
    /// Checked as a precondition *before* amounts are computed; the
    /// resolver itself never looks at usage counters.
    #[error("Promotion {code} has reached its usage limit of {limit}")]
    PromotionExhausted { code: String, limit: i64 },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The referenced line is not in the cart.
    #[error("Product {product_id} is not in the cart")]
    LineNotInCart { product_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user or admin input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A time window whose start is after its end.
    #[error("{field}: start of window must not be after its end")]
    InvalidWindow { field: String },

    /// Duplicate value (e.g., duplicate promotion code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
