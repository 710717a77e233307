//! # Customer Repository
//!
//! Customer lookup with a find-or-create write path keyed on email.
//! Checkout calls the transaction-scoped variant so the customer upsert and
//! the order insert commit or roll back together.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;
use vitrin_core::Customer;

use crate::error::{DbError, DbResult};

/// Repository for customer operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Fetches a customer by UUID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Fetches a customer by email, if one exists.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Returns the customer with this email, creating one if missing.
    pub async fn find_or_create(&self, email: &str, full_name: &str) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        Self::find_or_create_tx(&mut conn, email, full_name).await
    }

    /// Transaction-scoped find-or-create used by order creation.
    ///
    /// Takes a raw connection so it joins the caller's transaction.
    pub(crate) async fn find_or_create_tx(
        conn: &mut SqliteConnection,
        email: &str,
        full_name: &str,
    ) -> DbResult<Customer> {
        if let Some(existing) =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = ?")
                .bind(email)
                .fetch_optional(&mut *conn)
                .await?
        {
            return Ok(existing);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO customers (id, email, full_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(full_name)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        info!(customer_id = %id, "Customer created");

        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(&id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &id))
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

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let db = test_db().await;
        let repo = db.customers();

        let first = repo
            .find_or_create("ada@example.com", "Ada Lovelace")
            .await
            .unwrap();
        let second = repo
            .find_or_create("ada@example.com", "Ada L.")
            .await
            .unwrap();

        // same row, name from first creation sticks
        assert_eq!(first.id, second.id);
        assert_eq!(second.full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let db = test_db().await;
        let repo = db.customers();

        assert!(repo.find_by_email("ada@example.com").await.unwrap().is_none());

        repo.find_or_create("ada@example.com", "Ada Lovelace")
            .await
            .unwrap();

        let found = repo.find_by_email("ada@example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = test_db().await;
        let result = db.customers().get_by_id("missing").await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }
}
