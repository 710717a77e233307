//! # Order Repository
//!
//! Order persistence with atomic multi-row creation.
//!
//! ## Transaction Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create_with_lines (ONE transaction)                    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. find-or-create customer by email                                  │
//! │    2. guarded promotion usage increment (when a code was redeemed)      │
//! │    3. INSERT order header (frozen totals)                               │
//! │    4. INSERT every order line (frozen snapshots, numbered)              │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls the whole unit back. There is never an order        │
//! │  header without its lines, lines without a header, or a consumed       │
//! │  redemption without its order.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;
use vitrin_core::{CurrencyCode, Order, OrderLine, OrderStatus, OrderTotals};

use crate::error::{DbError, DbResult};
use crate::repository::customer::CustomerRepository;
use crate::repository::promotion::PromotionRepository;

// =============================================================================
// Write Models
// =============================================================================

/// A new order header to persist.
///
/// Totals arrive pre-computed from checkout; this layer freezes them as-is.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_email: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    pub currency: CurrencyCode,
    pub promotion_code: Option<String>,
    pub payment_reference: Option<String>,
}

/// A new order line to persist alongside its header.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewOrderLine {
    fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order and all of its lines in one transaction.
    ///
    /// The customer find-or-create and, when `promotion_code` is set, the
    /// guarded usage increment run inside the same transaction: a failed
    /// line insert or an exhausted code rolls everything back together.
    /// Returns the persisted order header.
    ///
    /// ## Errors
    /// - `DbError::PromotionLimitReached` when the code's usage ceiling is
    ///   hit (nothing is written)
    pub async fn create_with_lines(
        &self,
        new_order: NewOrder,
        lines: &[NewOrderLine],
    ) -> DbResult<Order> {
        if lines.is_empty() {
            return Err(DbError::TransactionFailed(
                "an order must have at least one line".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let customer = CustomerRepository::find_or_create_tx(
            &mut tx,
            &new_order.customer_email,
            &new_order.customer_name,
        )
        .await?;

        if let Some(code) = &new_order.promotion_code {
            if !PromotionRepository::increment_usage_tx(&mut tx, code).await? {
                return Err(DbError::PromotionLimitReached { code: code.clone() });
            }
        }

        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO orders
                (id, customer_id, status,
                 subtotal_cents, discount_cents, tax_cents, shipping_cents, total_cents,
                 currency, promotion_code, payment_reference, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order_id)
        .bind(&customer.id)
        .bind(new_order.status)
        .bind(new_order.totals.subtotal.cents())
        .bind(new_order.totals.discount.cents())
        .bind(new_order.totals.tax.cents())
        .bind(new_order.totals.shipping.cents())
        .bind(new_order.totals.total.cents())
        .bind(&new_order.currency)
        .bind(&new_order.promotion_code)
        .bind(&new_order.payment_reference)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // line_no carries the cart order; every line shares `now`
        for (idx, line) in lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_lines
                    (id, order_id, line_no, product_id, variant_id, name_snapshot,
                     quantity, unit_price_cents, line_total_cents, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(idx as i64 + 1)
            .bind(&line.product_id)
            .bind(&line.variant_id)
            .bind(&line.name_snapshot)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total_cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order_id,
            customer_id = %customer.id,
            total_cents = new_order.totals.total.cents(),
            lines = lines.len(),
            "Order created"
        );

        self.get_by_id(&order_id).await
    }

    /// Fetches an order header by UUID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Fetches the lines of an order, in cart order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_lines WHERE order_id = ? ORDER BY line_no",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE customer_id = ? ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Updates an order's lifecycle status.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(order_id = %id, ?status, "Order status updated");
        self.get_by_id(id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use crate::repository::promotion::NewPromotion;
    use vitrin_core::{DiscountKind, Money, PromotionKind, PromotionOutcome};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn currency(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    async fn seed_product(db: &Database, sku: &str, price_cents: i64) -> String {
        db.products()
            .insert(NewProduct {
                sku: sku.to_string(),
                name: format!("Product {}", sku),
                description: None,
                price_cents,
                currency: currency("USD"),
            })
            .await
            .unwrap()
            .id
    }

    fn totals(subtotal_cents: i64) -> OrderTotals {
        let subtotal = Money::from_cents(subtotal_cents);
        OrderTotals::compute(subtotal, PromotionOutcome::zero(subtotal), 0, Money::zero())
    }

    fn new_order(subtotal_cents: i64) -> NewOrder {
        NewOrder {
            customer_email: "ada@example.com".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            status: OrderStatus::Paid,
            totals: totals(subtotal_cents),
            currency: currency("TRY"),
            promotion_code: None,
            payment_reference: Some("pay-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_with_lines() {
        let db = test_db().await;
        let product_id = seed_product(&db, "TEE-001", 5_000).await;

        let order = db
            .orders()
            .create_with_lines(
                new_order(13_000),
                &[
                    NewOrderLine {
                        product_id: product_id.clone(),
                        variant_id: None,
                        name_snapshot: "Basic Tee".to_string(),
                        quantity: 2,
                        unit_price_cents: 5_000,
                    },
                    NewOrderLine {
                        product_id,
                        variant_id: None,
                        name_snapshot: "Basic Tee (gift)".to_string(),
                        quantity: 1,
                        unit_price_cents: 3_000,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(order.subtotal_cents, 13_000);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("pay-1"));

        let lines = db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].line_total_cents, 10_000);
        assert_eq!(lines[1].line_no, 2);
        assert_eq!(lines[1].line_total_cents, 3_000);

        // customer was created inside the same transaction
        let customer = db
            .customers()
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.customer_id, customer.id);
    }

    #[tokio::test]
    async fn test_lines_come_back_in_cart_order() {
        let db = test_db().await;
        let product_id = seed_product(&db, "TEE-001", 100).await;

        // all lines land with the same created_at, so only line_no can
        // distinguish them
        let cart: Vec<NewOrderLine> = (1..=6)
            .map(|n| NewOrderLine {
                product_id: product_id.clone(),
                variant_id: None,
                name_snapshot: format!("Item {}", n),
                quantity: 1,
                unit_price_cents: n * 100,
            })
            .collect();

        let order = db
            .orders()
            .create_with_lines(new_order(2_100), &cart)
            .await
            .unwrap();

        let lines = db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 6);
        for (idx, line) in lines.iter().enumerate() {
            assert_eq!(line.line_no, idx as i64 + 1);
            assert_eq!(line.name_snapshot, format!("Item {}", idx + 1));
            assert_eq!(line.unit_price_cents, (idx as i64 + 1) * 100);
        }
    }

    #[tokio::test]
    async fn test_empty_order_rejected() {
        let db = test_db().await;
        let result = db.orders().create_with_lines(new_order(0), &[]).await;
        assert!(matches!(result, Err(DbError::TransactionFailed(_))));
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_everything() {
        let db = test_db().await;
        let product_id = seed_product(&db, "TEE-001", 5_000).await;

        // second line violates the product FK, so the whole order must vanish
        let result = db
            .orders()
            .create_with_lines(
                new_order(10_000),
                &[
                    NewOrderLine {
                        product_id,
                        variant_id: None,
                        name_snapshot: "Basic Tee".to_string(),
                        quantity: 1,
                        unit_price_cents: 5_000,
                    },
                    NewOrderLine {
                        product_id: "no-such-product".to_string(),
                        variant_id: None,
                        name_snapshot: "Ghost".to_string(),
                        quantity: 1,
                        unit_price_cents: 5_000,
                    },
                ],
            )
            .await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));

        // nothing committed: no order, no lines, no customer
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);

        assert!(db
            .customers()
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .is_none());
    }

    fn limited_promo(code: &str, usage_limit: i64) -> NewPromotion {
        NewPromotion {
            code: code.to_string(),
            kind: PromotionKind::Coupon,
            discount_kind: DiscountKind::Percentage,
            discount_value: 1000,
            starts_at: None,
            ends_at: None,
            min_order_cents: None,
            max_discount_cents: None,
            usage_limit: Some(usage_limit),
        }
    }

    #[tokio::test]
    async fn test_order_consumes_one_redemption() {
        let db = test_db().await;
        let product_id = seed_product(&db, "TEE-001", 5_000).await;
        db.promotions().insert(limited_promo("LAUNCH", 5)).await.unwrap();

        let mut order = new_order(5_000);
        order.promotion_code = Some("LAUNCH".to_string());

        db.orders()
            .create_with_lines(
                order,
                &[NewOrderLine {
                    product_id,
                    variant_id: None,
                    name_snapshot: "Basic Tee".to_string(),
                    quantity: 1,
                    unit_price_cents: 5_000,
                }],
            )
            .await
            .unwrap();

        let promo = db.promotions().find_by_code("LAUNCH").await.unwrap().unwrap();
        assert_eq!(promo.usage_count, 1);
    }

    #[tokio::test]
    async fn test_failed_line_releases_redemption() {
        let db = test_db().await;
        seed_product(&db, "TEE-001", 5_000).await;
        db.promotions().insert(limited_promo("LAUNCH", 5)).await.unwrap();

        let mut order = new_order(5_000);
        order.promotion_code = Some("LAUNCH".to_string());

        // the line violates the product FK after the usage increment ran;
        // the rollback must return the redemption too
        let result = db
            .orders()
            .create_with_lines(
                order,
                &[NewOrderLine {
                    product_id: "no-such-product".to_string(),
                    variant_id: None,
                    name_snapshot: "Ghost".to_string(),
                    quantity: 1,
                    unit_price_cents: 5_000,
                }],
            )
            .await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));

        let promo = db.promotions().find_by_code("LAUNCH").await.unwrap().unwrap();
        assert_eq!(promo.usage_count, 0);
    }

    #[tokio::test]
    async fn test_exhausted_code_blocks_order() {
        let db = test_db().await;
        let product_id = seed_product(&db, "TEE-001", 5_000).await;
        db.promotions().insert(limited_promo("ONCE", 1)).await.unwrap();
        assert!(db.promotions().increment_usage("ONCE").await.unwrap());

        let mut order = new_order(5_000);
        order.promotion_code = Some("ONCE".to_string());

        let result = db
            .orders()
            .create_with_lines(
                order,
                &[NewOrderLine {
                    product_id,
                    variant_id: None,
                    name_snapshot: "Basic Tee".to_string(),
                    quantity: 1,
                    unit_price_cents: 5_000,
                }],
            )
            .await;

        assert!(matches!(
            result,
            Err(DbError::PromotionLimitReached { ref code }) if code == "ONCE"
        ));

        // the refused order left nothing behind
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);

        let promo = db.promotions().find_by_code("ONCE").await.unwrap().unwrap();
        assert_eq!(promo.usage_count, 1);
    }

    #[tokio::test]
    async fn test_list_for_customer_and_status_update() {
        let db = test_db().await;
        let product_id = seed_product(&db, "TEE-001", 5_000).await;

        let line = NewOrderLine {
            product_id,
            variant_id: None,
            name_snapshot: "Basic Tee".to_string(),
            quantity: 1,
            unit_price_cents: 5_000,
        };

        let order = db
            .orders()
            .create_with_lines(new_order(5_000), std::slice::from_ref(&line))
            .await
            .unwrap();

        let orders = db.orders().list_for_customer(&order.customer_id).await.unwrap();
        assert_eq!(orders.len(), 1);

        let cancelled = db
            .orders()
            .update_status(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }
}
