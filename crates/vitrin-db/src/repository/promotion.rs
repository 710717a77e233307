//! # Promotion Repository
//!
//! Promotion persistence and the usage counter.
//!
//! ## Usage Counter Concurrency
//! Two checkouts can race on the last redemption of a limited code. The
//! counter is therefore advanced with a single guarded UPDATE:
//!
//! ```sql
//! UPDATE promotions SET usage_count = usage_count + 1
//! WHERE code = ? AND (usage_limit IS NULL OR usage_count < usage_limit)
//! ```
//!
//! Zero rows affected means the limit was hit in between; the caller rolls
//! the order back. No read-modify-write, no lost updates.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;
use vitrin_core::{DiscountKind, Promotion, PromotionKind};

use crate::error::{DbError, DbResult};

/// A new promotion to insert.
#[derive(Debug, Clone)]
pub struct NewPromotion {
    pub code: String,
    pub kind: PromotionKind,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    pub starts_at: Option<chrono::DateTime<Utc>>,
    pub ends_at: Option<chrono::DateTime<Utc>>,
    pub min_order_cents: Option<i64>,
    pub max_discount_cents: Option<i64>,
    pub usage_limit: Option<i64>,
}

/// Repository for promotion operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Looks up a promotion by its code.
    ///
    /// Returns `Ok(None)` for an unknown code - checkout turns that into
    /// its own "code not found" error, it is not a database failure.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(promotion)
    }

    /// Lists promotions, active first, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Promotion>> {
        let promotions = sqlx::query_as::<_, Promotion>(
            "SELECT * FROM promotions
             ORDER BY is_active DESC, created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }

    /// Inserts a new promotion and returns it.
    ///
    /// The code is expected pre-normalized (uppercase) by
    /// `vitrin_core::validation::validate_promotion_code`.
    pub async fn insert(&self, new: NewPromotion) -> DbResult<Promotion> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO promotions
                (id, code, kind, discount_kind, discount_value,
                 starts_at, ends_at, min_order_cents, max_discount_cents,
                 usage_limit, usage_count, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&new.code)
        .bind(new.kind)
        .bind(new.discount_kind)
        .bind(new.discount_value)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.min_order_cents)
        .bind(new.max_discount_cents)
        .bind(new.usage_limit)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(promotion_id = %id, code = %new.code, "Promotion created");

        self.find_by_code(&new.code)
            .await?
            .ok_or_else(|| DbError::not_found("Promotion", &new.code))
    }

    /// Atomically consumes one redemption of a limited code.
    ///
    /// Order creation uses [`increment_usage_tx`] so the redemption commits
    /// or rolls back with the order; this standalone variant exists for
    /// back-office corrections.
    ///
    /// ## Returns
    /// - `true`: counter advanced, the redemption is yours
    /// - `false`: usage limit already reached (lost the race, or exhausted)
    ///
    /// [`increment_usage_tx`]: PromotionRepository::increment_usage_tx
    pub async fn increment_usage(&self, code: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::increment_usage_tx(&mut conn, code).await
    }

    /// Transaction-scoped guarded increment used by order creation.
    ///
    /// Takes a raw connection so it joins the caller's transaction; the
    /// conditional UPDATE is the authoritative usage gate.
    pub(crate) async fn increment_usage_tx(
        conn: &mut SqliteConnection,
        code: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE promotions
             SET usage_count = usage_count + 1, updated_at = ?
             WHERE code = ?
               AND (usage_limit IS NULL OR usage_count < usage_limit)",
        )
        .bind(Utc::now())
        .bind(code)
        .execute(&mut *conn)
        .await?;

        let consumed = result.rows_affected() > 0;
        if consumed {
            info!(code = %code, "Promotion redemption recorded");
        } else {
            warn!(code = %code, "Promotion redemption refused (limit reached)");
        }
        Ok(consumed)
    }

    /// Flips the admin kill-switch.
    pub async fn set_active(&self, code: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE promotions SET is_active = ?, updated_at = ? WHERE code = ?",
        )
        .bind(active)
        .bind(Utc::now())
        .bind(code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", code));
        }

        info!(code = %code, active, "Promotion active flag updated");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_promo(code: &str, usage_limit: Option<i64>) -> NewPromotion {
        NewPromotion {
            code: code.to_string(),
            kind: PromotionKind::Coupon,
            discount_kind: DiscountKind::Percentage,
            discount_value: 1000,
            starts_at: None,
            ends_at: None,
            min_order_cents: None,
            max_discount_cents: None,
            usage_limit,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = test_db().await;
        let repo = db.promotions();

        let created = repo.insert(new_promo("SAVE10", None)).await.unwrap();
        assert_eq!(created.code, "SAVE10");
        assert_eq!(created.usage_count, 0);
        assert!(created.is_active);

        assert!(repo.find_by_code("SAVE10").await.unwrap().is_some());
        assert!(repo.find_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        let repo = db.promotions();

        repo.insert(new_promo("SAVE10", None)).await.unwrap();
        let result = repo.insert(new_promo("SAVE10", None)).await;

        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_increment_usage_respects_limit() {
        let db = test_db().await;
        let repo = db.promotions();

        repo.insert(new_promo("LIMIT2", Some(2))).await.unwrap();

        assert!(repo.increment_usage("LIMIT2").await.unwrap());
        assert!(repo.increment_usage("LIMIT2").await.unwrap());
        // third redemption refused
        assert!(!repo.increment_usage("LIMIT2").await.unwrap());

        let promo = repo.find_by_code("LIMIT2").await.unwrap().unwrap();
        assert_eq!(promo.usage_count, 2);
    }

    #[tokio::test]
    async fn test_increment_usage_unlimited() {
        let db = test_db().await;
        let repo = db.promotions();

        repo.insert(new_promo("FOREVER", None)).await.unwrap();
        for _ in 0..5 {
            assert!(repo.increment_usage("FOREVER").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_increment_unknown_code_is_false() {
        let db = test_db().await;
        assert!(!db.promotions().increment_usage("GHOST").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = test_db().await;
        let repo = db.promotions();

        repo.insert(new_promo("SAVE10", None)).await.unwrap();
        repo.set_active("SAVE10", false).await.unwrap();

        let promo = repo.find_by_code("SAVE10").await.unwrap().unwrap();
        assert!(!promo.is_active);

        assert!(matches!(
            repo.set_active("GHOST", true).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
