//! # Payment Gateway Seam
//!
//! Checkout never talks to a payment provider directly; it goes through the
//! [`PaymentGateway`] trait. The default [`AutoApproveGateway`] approves
//! every charge and is what development, tests, and demo deployments run
//! with. A real provider integration implements the same trait.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;
use vitrin_core::{CurrencyCode, Money};

/// The outcome of a successful charge authorization.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentReceipt {
    /// Provider-side reference, stored on the order.
    pub reference: String,

    /// Amount charged, in reporting-currency minor units.
    pub amount_cents: i64,
}

/// A payment provider capable of authorizing charges.
///
/// Implementations decide entirely on their own what "authorized" means;
/// checkout only cares about approved vs. declined.
pub trait PaymentGateway: Send + Sync {
    /// Authorizes a charge for `amount` in `currency`.
    ///
    /// ## Returns
    /// - `Ok(receipt)`: charge approved, reference for the order record
    /// - `Err(reason)`: charge declined, human-readable reason
    fn authorize_charge(
        &self,
        amount: Money,
        currency: &CurrencyCode,
    ) -> impl std::future::Future<Output = Result<PaymentReceipt, String>> + Send;
}

/// A gateway that approves every charge.
#[derive(Debug, Clone, Default)]
pub struct AutoApproveGateway;

impl PaymentGateway for AutoApproveGateway {
    async fn authorize_charge(
        &self,
        amount: Money,
        currency: &CurrencyCode,
    ) -> Result<PaymentReceipt, String> {
        let reference = format!("auto-{}", Uuid::new_v4());
        info!(%reference, amount = %amount, %currency, "Charge auto-approved");

        Ok(PaymentReceipt {
            reference,
            amount_cents: amount.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
