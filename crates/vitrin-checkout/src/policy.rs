//! # Authorization Policy
//!
//! One table answering "may this role perform this action?". Every
//! privileged entry point calls [`authorize`] before doing anything, so the
//! rules live in exactly one place instead of being scattered across
//! handlers.
//!
//! ```text
//! ┌───────────────────────┬──────────┬───────┐
//! │ Action                │ Customer │ Admin │
//! ├───────────────────────┼──────────┼───────┤
//! │ BrowseCatalog         │    ✓     │   ✓   │
//! │ PlaceOrder            │    ✓     │   ✓   │
//! │ ViewOwnOrders         │    ✓     │   ✓   │
//! │ ManageCatalog         │    ✗     │   ✓   │
//! │ PostExchangeRate      │    ✗     │   ✓   │
//! │ ManagePromotions      │    ✗     │   ✓   │
//! │ ViewAllOrders         │    ✗     │   ✓   │
//! └───────────────────────┴──────────┴───────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CheckoutError, CheckoutResult};

/// The caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    /// A shopper: browse, cart, checkout, own history.
    Customer,
    /// Back-office staff: everything, including catalog and rates.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// An action requiring authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Action {
    BrowseCatalog,
    ManageCatalog,
    PostExchangeRate,
    ManagePromotions,
    PlaceOrder,
    ViewOwnOrders,
    ViewAllOrders,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::BrowseCatalog => "browse_catalog",
            Action::ManageCatalog => "manage_catalog",
            Action::PostExchangeRate => "post_exchange_rate",
            Action::ManagePromotions => "manage_promotions",
            Action::PlaceOrder => "place_order",
            Action::ViewOwnOrders => "view_own_orders",
            Action::ViewAllOrders => "view_all_orders",
        };
        f.write_str(name)
    }
}

/// Checks whether `role` may perform `action`.
///
/// Returns `CheckoutError::Forbidden` on denial so callers can `?` straight
/// through.
pub fn authorize(role: Role, action: Action) -> CheckoutResult<()> {
    let allowed = match role {
        Role::Admin => true,
        Role::Customer => matches!(
            action,
            Action::BrowseCatalog | Action::PlaceOrder | Action::ViewOwnOrders
        ),
    };

    if allowed {
        Ok(())
    } else {
        Err(CheckoutError::Forbidden { role, action })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
