//! # vitrin-db: Database Layer
//!
//! SQLite persistence for Vitrin.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          vitrin-db                                      │
//! │                                                                         │
//! │   Database (pool.rs)                                                    │
//! │       │                                                                 │
//! │       ├── products()       → ProductRepository                          │
//! │       ├── exchange_rates() → ExchangeRateRepository                     │
//! │       ├── promotions()     → PromotionRepository                        │
//! │       ├── customers()      → CustomerRepository                         │
//! │       └── orders()         → OrderRepository                            │
//! │                                                                         │
//! │   migrations.rs → embedded SQL migrations (sqlx::migrate!)              │
//! │   error.rs      → DbError / DbResult                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use vitrin_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./vitrin.db")).await?;
//! let table = db
//!     .exchange_rates()
//!     .table_for_date(reporting, today)
//!     .await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    CustomerRepository, ExchangeRateRepository, NewOrder, NewOrderLine, OrderRepository,
    ProductRepository, PromotionRepository,
};
pub use repository::product::NewProduct;
pub use repository::promotion::NewPromotion;
