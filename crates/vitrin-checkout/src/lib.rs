//! # vitrin-checkout: Checkout Orchestration
//!
//! The application layer of Vitrin: everything between the storefront and
//! the pricing/persistence crates.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        vitrin-checkout                                  │
//! │                                                                         │
//! │  context.rs   AppContext: config + database, built once at startup     │
//! │  config.rs    AppConfig: reporting currency, tax, shipping, VITRIN_*   │
//! │  policy.rs    authorize(role, action): the one permission table        │
//! │  payment.rs   PaymentGateway trait + AutoApproveGateway default        │
//! │  checkout.rs  CheckoutService: quote() and place_order()               │
//! │  error.rs     CheckoutError: what the storefront renders               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use vitrin_checkout::{init_tracing, AppConfig, AppContext, Role};
//!
//! init_tracing();
//! let ctx = AppContext::init(AppConfig::from_env()?).await?;
//!
//! let service = ctx.checkout();
//! let quote = service.quote(&cart, Some("AUTUMN15"), Utc::now()).await?;
//! let order = service
//!     .place_order(Role::Customer, &cart, Some("AUTUMN15"),
//!                  "ada@example.com", "Ada Lovelace", Utc::now())
//!     .await?;
//! ```

pub mod checkout;
pub mod config;
pub mod context;
pub mod error;
pub mod payment;
pub mod policy;

pub use checkout::{CheckoutQuote, CheckoutService, QuoteLine};
pub use config::AppConfig;
pub use context::{init_tracing, AppContext};
pub use error::{CheckoutError, CheckoutResult};
pub use payment::{AutoApproveGateway, PaymentGateway, PaymentReceipt};
pub use policy::{authorize, Action, Role};
