//! # Repository Pattern Implementation
//!
//! Each repository owns the SQL for one aggregate and returns the plain
//! structs from `vitrin-core`. No pricing logic lives here - repositories
//! read and write rows, `vitrin-core` decides what the numbers mean.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Repository Layout                                │
//! │                                                                         │
//! │  ProductRepository      → products, product_variants                    │
//! │  ExchangeRateRepository → exchange_rates (daily upsert, RateTable)      │
//! │  PromotionRepository    → promotions (usage counter lives here)         │
//! │  CustomerRepository     → customers (find-or-create by email)           │
//! │  OrderRepository        → orders, order_lines (single transaction)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod exchange_rate;
pub mod order;
pub mod product;
pub mod promotion;

pub use customer::CustomerRepository;
pub use exchange_rate::ExchangeRateRepository;
pub use order::{NewOrder, NewOrderLine, OrderRepository};
pub use product::ProductRepository;
pub use promotion::PromotionRepository;
