//! # Checkout Orchestration
//!
//! Ties the pricing pipeline (vitrin-core) to persistence (vitrin-db) and
//! the payment gateway.
//!
//! ## Quote Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            quote()                                      │
//! │                                                                         │
//! │  tokio::try_join! ─┬─ today's rate table                                │
//! │                    ├─ promotion by code (when entered)                  │
//! │                    └─ live products + variants for every cart line      │
//! │       │                                                                 │
//! │       ▼  (pricing starts only once all three fetches landed)           │
//! │  per line: product sale → rate resolution → quantity × unit price      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal → promotion outcome → tax → shipping → OrderTotals           │
//! │                                                                         │
//! │  Lines whose currency has no rate today are listed in `unconverted`    │
//! │  and excluded from the totals; the quote itself never fails for a      │
//! │  missing rate.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Flow
//! `place_order` runs the same quote, then refuses unconverted lines,
//! charges the gateway, and persists the order in a single vitrin-db
//! transaction that also consumes one promotion redemption with the
//! guarded counter. A failed write releases the redemption with the
//! rollback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use ts_rs::TS;
use vitrin_core::validation::{validate_email, validate_promotion_code};
use vitrin_core::{
    apply_promotion, Cart, CoreError, CurrencyCode, Money, Order, OrderStatus, OrderTotals,
    Product, ProductVariant, Promotion,
};
use vitrin_db::{Database, DbError, NewOrder, NewOrderLine};

use crate::config::AppConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::payment::{AutoApproveGateway, PaymentGateway};
use crate::policy::{authorize, Action, Role};

// =============================================================================
// Quote Types
// =============================================================================

/// One priced line of a quote.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub quantity: i64,

    /// Resolved unit price in reporting-currency minor units.
    /// For unconverted lines this is the raw stored amount instead.
    pub unit_price_cents: i64,

    /// quantity × unit price.
    pub line_total_cents: i64,

    /// False when no rate was on file for the product's currency.
    pub converted: bool,
}

/// A priced cart: what the checkout page renders.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutQuote {
    pub lines: Vec<QuoteLine>,

    /// Currencies that had no rate today; non-empty means the totals only
    /// cover the converted lines and the order cannot be placed yet.
    pub unconverted: Vec<CurrencyCode>,

    /// Normalized promotion code the quote was computed with.
    pub promotion_code: Option<String>,

    pub totals: OrderTotals,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// The checkout service: quote computation and order placement.
#[derive(Debug, Clone)]
pub struct CheckoutService<G = AutoApproveGateway> {
    db: Database,
    config: AppConfig,
    gateway: G,
}

impl CheckoutService<AutoApproveGateway> {
    /// Creates a service with the default auto-approving gateway.
    pub fn new(db: Database, config: AppConfig) -> Self {
        CheckoutService {
            db,
            config,
            gateway: AutoApproveGateway,
        }
    }
}

impl<G: PaymentGateway> CheckoutService<G> {
    /// Creates a service with a specific payment gateway.
    pub fn with_gateway(db: Database, config: AppConfig, gateway: G) -> Self {
        CheckoutService {
            db,
            config,
            gateway,
        }
    }

    /// Prices a cart: live products, today's rates, the promotion, totals.
    ///
    /// The three fetches run concurrently; pricing starts only when all of
    /// them have landed.
    #[instrument(skip(self, cart), fields(lines = cart.line_count()))]
    pub async fn quote(
        &self,
        cart: &Cart,
        promotion_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> CheckoutResult<CheckoutQuote> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let (table, promotion, products) = tokio::try_join!(
            self.fetch_rate_table(now),
            self.fetch_promotion(promotion_code, now),
            self.fetch_products(cart),
        )?;

        let mut lines = Vec::with_capacity(cart.line_count());
        let mut unconverted: Vec<CurrencyCode> = Vec::new();
        let mut subtotal = Money::zero();

        for cart_line in &cart.lines {
            let (product, variants) = products
                .get(&cart_line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(cart_line.product_id.clone()))?;

            let listed = match &cart_line.variant_id {
                Some(variant_id) => variants
                    .iter()
                    .find(|v| &v.id == variant_id)
                    .ok_or_else(|| CoreError::ProductNotFound(variant_id.clone()))?
                    .effective_price(product, now),
                None => product.effective_price(now),
            };

            let resolved = table.resolve(listed, &product.currency);
            let converted = resolved.is_converted();
            let unit_price = resolved.amount();
            let line_total = unit_price.multiply_quantity(cart_line.quantity);

            if converted {
                subtotal += line_total;
            } else if !unconverted.contains(&product.currency) {
                warn!(currency = %product.currency, "No exchange rate on file");
                unconverted.push(product.currency.clone());
            }

            lines.push(QuoteLine {
                product_id: cart_line.product_id.clone(),
                variant_id: cart_line.variant_id.clone(),
                name: cart_line.name.clone(),
                quantity: cart_line.quantity,
                unit_price_cents: unit_price.cents(),
                line_total_cents: line_total.cents(),
                converted,
            });
        }

        let outcome = apply_promotion(subtotal, promotion.as_ref(), now);
        let shipping = self.config.shipping_for(outcome.total);
        let totals = OrderTotals::compute(subtotal, outcome, self.config.tax_rate_bps, shipping);

        Ok(CheckoutQuote {
            lines,
            unconverted,
            promotion_code: promotion.map(|p| p.code),
            totals,
        })
    }

    /// Places an order: quote, charge, persist.
    ///
    /// ## Sequence
    /// 1. Authorize the caller for `PlaceOrder`
    /// 2. Quote the cart; refuse if any line is unconverted
    /// 3. Charge the payment gateway for the final total
    /// 4. Persist customer + order + lines in one transaction, which also
    ///    consumes one promotion redemption via the guarded counter
    #[instrument(skip(self, cart, customer_email, customer_name))]
    pub async fn place_order(
        &self,
        role: Role,
        cart: &Cart,
        promotion_code: Option<&str>,
        customer_email: &str,
        customer_name: &str,
        now: DateTime<Utc>,
    ) -> CheckoutResult<Order> {
        authorize(role, Action::PlaceOrder)?;

        validate_email(customer_email).map_err(CoreError::from)?;
        let email = customer_email.trim().to_string();

        let quote = self.quote(cart, promotion_code, now).await?;

        if !quote.unconverted.is_empty() {
            return Err(CheckoutError::UnconvertedPrices {
                currencies: quote.unconverted,
            });
        }

        let receipt = self
            .gateway
            .authorize_charge(quote.totals.total, &self.config.reporting_currency)
            .await
            .map_err(|reason| CheckoutError::PaymentDeclined { reason })?;

        let order_lines: Vec<NewOrderLine> = quote
            .lines
            .iter()
            .map(|line| NewOrderLine {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                name_snapshot: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            })
            .collect();

        // the transaction holds the authoritative usage gate; the earlier
        // snapshot check in fetch_promotion only produced a friendlier
        // early error
        let order = self
            .db
            .orders()
            .create_with_lines(
                NewOrder {
                    customer_email: email,
                    customer_name: customer_name.to_string(),
                    status: OrderStatus::Paid,
                    totals: quote.totals,
                    currency: self.config.reporting_currency.clone(),
                    promotion_code: quote.promotion_code.clone(),
                    payment_reference: Some(receipt.reference),
                },
                &order_lines,
            )
            .await
            .map_err(|err| match err {
                DbError::PromotionLimitReached { code } => {
                    CheckoutError::PromotionExhausted { code }
                }
                other => CheckoutError::from(other),
            })?;

        info!(
            order_id = %order.id,
            total_cents = order.total_cents,
            "Order placed"
        );
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Fetch helpers (each a single future for try_join!)
    // -------------------------------------------------------------------------

    async fn fetch_rate_table(
        &self,
        now: DateTime<Utc>,
    ) -> CheckoutResult<vitrin_core::RateTable> {
        let table = self
            .db
            .exchange_rates()
            .table_for_date(self.config.reporting_currency.clone(), now.date_naive())
            .await?;
        Ok(table)
    }

    async fn fetch_promotion(
        &self,
        code: Option<&str>,
        now: DateTime<Utc>,
    ) -> CheckoutResult<Option<Promotion>> {
        let Some(raw) = code else {
            return Ok(None);
        };

        let code = validate_promotion_code(raw).map_err(CoreError::from)?;

        let promotion = self
            .db
            .promotions()
            .find_by_code(&code)
            .await?
            .ok_or(CheckoutError::PromotionNotFound { code: code.clone() })?;

        if !promotion.is_redeemable(now) {
            return Err(CheckoutError::PromotionNotRedeemable { code });
        }

        if !promotion.has_uses_remaining() {
            return Err(CheckoutError::PromotionExhausted { code });
        }

        Ok(Some(promotion))
    }

    async fn fetch_products(
        &self,
        cart: &Cart,
    ) -> CheckoutResult<HashMap<String, (Product, Vec<ProductVariant>)>> {
        let repo = self.db.products();
        let mut products = HashMap::new();

        for line in &cart.lines {
            if products.contains_key(&line.product_id) {
                continue;
            }
            let fetched = repo.get_with_variants(&line.product_id).await?;
            products.insert(line.product_id.clone(), fetched);
        }

        Ok(products)
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vitrin_core::{DiscountKind, ExchangeRate, PromotionKind, RATE_SCALE};
    use vitrin_db::{DbConfig, NewProduct, NewPromotion};

    use crate::payment::PaymentReceipt;

    /// A gateway that declines everything.
    #[derive(Debug, Clone, Default)]
    struct DeclineGateway;

    impl PaymentGateway for DeclineGateway {
        async fn authorize_charge(
            &self,
            _amount: Money,
            _currency: &CurrencyCode,
        ) -> Result<PaymentReceipt, String> {
            Err("card declined".to_string())
        }
    }

    fn currency(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
    }

    fn config() -> AppConfig {
        AppConfig {
            reporting_currency: currency("TRY"),
            ..AppConfig::default()
        }
    }

    async fn seeded_db() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // one USD product and today's USD→TRY rate
        let product = db
            .products()
            .insert(NewProduct {
                sku: "KBD-001".to_string(),
                name: "Mechanical Keyboard".to_string(),
                description: None,
                price_cents: 10_000, // 100.00 USD
                currency: currency("USD"),
            })
            .await
            .unwrap();

        db.exchange_rates()
            .upsert(&ExchangeRate {
                currency: currency("USD"),
                rate_micros: 32 * RATE_SCALE + RATE_SCALE / 2, // 32.5
                effective_date: now().date_naive(),
            })
            .await
            .unwrap();

        (db, product.id)
    }

    fn cart_with_one(product_id: &str) -> Cart {
        let mut cart = Cart::new();
        cart.add_line(product_id, None, "Mechanical Keyboard", Money::zero(), 1)
            .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_quote_resolves_and_totals() {
        let (db, product_id) = seeded_db().await;
        let service = CheckoutService::new(db, config());

        let quote = service
            .quote(&cart_with_one(&product_id), None, now())
            .await
            .unwrap();

        // 100.00 USD × 32.5 = 3250.00 TRY
        assert!(quote.unconverted.is_empty());
        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.lines[0].unit_price_cents, 325_000);
        assert_eq!(quote.totals.subtotal, Money::from_cents(325_000));
        assert_eq!(quote.totals.total, Money::from_cents(325_000));
    }

    #[tokio::test]
    async fn test_quote_serializes_for_storefront() {
        let (db, product_id) = seeded_db().await;
        let service = CheckoutService::new(db, config());

        let quote = service
            .quote(&cart_with_one(&product_id), None, now())
            .await
            .unwrap();

        // the shape the SPA consumes: cents as bare integers, no wrappers
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["lines"][0]["unit_price_cents"], 325_000);
        assert_eq!(json["lines"][0]["converted"], true);
        assert_eq!(json["unconverted"], serde_json::json!([]));
        assert_eq!(json["promotion_code"], serde_json::Value::Null);
        assert_eq!(json["totals"]["total"], 325_000);
    }

    #[tokio::test]
    async fn test_quote_empty_cart_rejected() {
        let (db, _) = seeded_db().await;
        let service = CheckoutService::new(db, config());

        let result = service.quote(&Cart::new(), None, now()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_quote_with_promotion() {
        let (db, product_id) = seeded_db().await;
        db.promotions()
            .insert(NewPromotion {
                code: "AUTUMN15".to_string(),
                kind: PromotionKind::Campaign,
                discount_kind: DiscountKind::Percentage,
                discount_value: 1500,
                starts_at: None,
                ends_at: None,
                min_order_cents: None,
                max_discount_cents: None,
                usage_limit: None,
            })
            .await
            .unwrap();
        let service = CheckoutService::new(db, config());

        let quote = service
            .quote(&cart_with_one(&product_id), Some("autumn15"), now())
            .await
            .unwrap();

        // code normalized to uppercase, 15% off 3250.00 → 2762.50
        assert_eq!(quote.promotion_code.as_deref(), Some("AUTUMN15"));
        assert_eq!(quote.totals.discount, Money::from_cents(48_750));
        assert_eq!(quote.totals.total, Money::from_cents(276_250));
    }

    #[tokio::test]
    async fn test_quote_unknown_code_rejected() {
        let (db, product_id) = seeded_db().await;
        let service = CheckoutService::new(db, config());

        let result = service
            .quote(&cart_with_one(&product_id), Some("GHOST"), now())
            .await;
        assert!(matches!(result, Err(CheckoutError::PromotionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_quote_reports_unconverted_currency() {
        let (db, _) = seeded_db().await;

        // a EUR product with no EUR rate posted
        let eur_product = db
            .products()
            .insert(NewProduct {
                sku: "MUG-001".to_string(),
                name: "Mug".to_string(),
                description: None,
                price_cents: 1_500,
                currency: currency("EUR"),
            })
            .await
            .unwrap();
        let service = CheckoutService::new(db, config());

        let quote = service
            .quote(&cart_with_one(&eur_product.id), None, now())
            .await
            .unwrap();

        assert_eq!(quote.unconverted, vec![currency("EUR")]);
        assert!(!quote.lines[0].converted);
        // raw amount carried through, excluded from totals
        assert_eq!(quote.lines[0].unit_price_cents, 1_500);
        assert_eq!(quote.totals.subtotal, Money::zero());
    }

    #[tokio::test]
    async fn test_place_order_happy_path() {
        let (db, product_id) = seeded_db().await;
        let service = CheckoutService::new(db.clone(), config());

        let order = service
            .place_order(
                Role::Customer,
                &cart_with_one(&product_id),
                None,
                "ada@example.com",
                "Ada Lovelace",
                now(),
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total_cents, 325_000);
        assert_eq!(order.currency, currency("TRY"));
        assert!(order.payment_reference.is_some());

        let lines = db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price_cents, 325_000);
        assert_eq!(lines[0].name_snapshot, "Mechanical Keyboard");
    }

    #[tokio::test]
    async fn test_place_order_refuses_unconverted_lines() {
        let (db, _) = seeded_db().await;
        let eur_product = db
            .products()
            .insert(NewProduct {
                sku: "MUG-001".to_string(),
                name: "Mug".to_string(),
                description: None,
                price_cents: 1_500,
                currency: currency("EUR"),
            })
            .await
            .unwrap();
        let service = CheckoutService::new(db, config());

        let result = service
            .place_order(
                Role::Customer,
                &cart_with_one(&eur_product.id),
                None,
                "ada@example.com",
                "Ada Lovelace",
                now(),
            )
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::UnconvertedPrices { .. })
        ));
    }

    #[tokio::test]
    async fn test_place_order_declined_payment() {
        let (db, product_id) = seeded_db().await;
        let service = CheckoutService::with_gateway(db.clone(), config(), DeclineGateway);

        let result = service
            .place_order(
                Role::Customer,
                &cart_with_one(&product_id),
                None,
                "ada@example.com",
                "Ada Lovelace",
                now(),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::PaymentDeclined { .. })));

        // declined charge persists nothing, not even the customer
        assert!(db
            .customers()
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_place_order_consumes_promotion_use() {
        let (db, product_id) = seeded_db().await;
        db.promotions()
            .insert(NewPromotion {
                code: "ONCE".to_string(),
                kind: PromotionKind::Coupon,
                discount_kind: DiscountKind::FixedAmount,
                discount_value: 10_000,
                starts_at: None,
                ends_at: None,
                min_order_cents: None,
                max_discount_cents: None,
                usage_limit: Some(1),
            })
            .await
            .unwrap();
        let service = CheckoutService::new(db.clone(), config());

        service
            .place_order(
                Role::Customer,
                &cart_with_one(&product_id),
                Some("ONCE"),
                "ada@example.com",
                "Ada Lovelace",
                now(),
            )
            .await
            .unwrap();

        // second redemption refused up front
        let result = service
            .place_order(
                Role::Customer,
                &cart_with_one(&product_id),
                Some("ONCE"),
                "bob@example.com",
                "Bob",
                now(),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::PromotionExhausted { .. })));
    }

    /// Approves the charge but first consumes a promotion redemption, the
    /// way a concurrent checkout would in the window between this one's
    /// quote and its order transaction.
    #[derive(Debug, Clone)]
    struct RacingGateway {
        db: Database,
        code: String,
    }

    impl PaymentGateway for RacingGateway {
        async fn authorize_charge(
            &self,
            amount: Money,
            currency: &CurrencyCode,
        ) -> Result<PaymentReceipt, String> {
            self.db
                .promotions()
                .increment_usage(&self.code)
                .await
                .map_err(|e| e.to_string())?;
            AutoApproveGateway.authorize_charge(amount, currency).await
        }
    }

    #[tokio::test]
    async fn test_lost_redemption_race_rolls_order_back() {
        let (db, product_id) = seeded_db().await;
        db.promotions()
            .insert(NewPromotion {
                code: "ONCE".to_string(),
                kind: PromotionKind::Coupon,
                discount_kind: DiscountKind::FixedAmount,
                discount_value: 10_000,
                starts_at: None,
                ends_at: None,
                min_order_cents: None,
                max_discount_cents: None,
                usage_limit: Some(1),
            })
            .await
            .unwrap();

        let gateway = RacingGateway {
            db: db.clone(),
            code: "ONCE".to_string(),
        };
        let service = CheckoutService::with_gateway(db.clone(), config(), gateway);

        // the quote snapshot still saw a use remaining, but the guarded
        // increment inside the order transaction finds none left
        let result = service
            .place_order(
                Role::Customer,
                &cart_with_one(&product_id),
                Some("ONCE"),
                "ada@example.com",
                "Ada Lovelace",
                now(),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::PromotionExhausted { .. })));

        // the whole transaction rolled back: no customer, counter untouched
        assert!(db
            .customers()
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .is_none());

        let promo = db.promotions().find_by_code("ONCE").await.unwrap().unwrap();
        assert_eq!(promo.usage_count, 1);
    }

    #[tokio::test]
    async fn test_place_order_invalid_email_rejected() {
        let (db, product_id) = seeded_db().await;
        let service = CheckoutService::new(db, config());

        let result = service
            .place_order(
                Role::Customer,
                &cart_with_one(&product_id),
                None,
                "not-an-email",
                "Ada",
                now(),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::Core(_))));
    }
}
