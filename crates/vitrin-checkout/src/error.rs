//! # Checkout Error Types
//!
//! Errors surfaced to the storefront. Each variant maps to a specific
//! message the UI can render; infrastructure errors from the lower layers
//! pass through with `#[from]`.

use thiserror::Error;
use vitrin_core::{CoreError, CurrencyCode};
use vitrin_db::DbError;

use crate::policy::{Action, Role};

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requested on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The entered promotion code does not exist.
    #[error("Promotion code '{code}' not found")]
    PromotionNotFound { code: String },

    /// The code exists but is switched off or outside its window.
    #[error("Promotion code '{code}' is not currently active")]
    PromotionNotRedeemable { code: String },

    /// The code's usage limit has been reached.
    #[error("Promotion code '{code}' has no redemptions left")]
    PromotionExhausted { code: String },

    /// One or more cart lines could not be converted into the reporting
    /// currency; checkout refuses until rates are posted.
    #[error("Missing exchange rates for: {}", .currencies.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "))]
    UnconvertedPrices { currencies: Vec<CurrencyCode> },

    /// The payment gateway declined the charge.
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// The caller's role does not permit the action.
    #[error("{role} is not allowed to perform {action}")]
    Forbidden { role: Role, action: Action },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pricing-layer error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence-layer error.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
