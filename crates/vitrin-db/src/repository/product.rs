//! # Product Repository
//!
//! Catalog reads and admin writes for products and their variants.
//!
//! Prices are stored exactly as the row says (minor units of the product's
//! own currency); resolution into the reporting currency is `vitrin-core`'s
//! job, never SQL's.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;
use vitrin_core::{CurrencyCode, DiscountKind, Product, ProductVariant};

use crate::error::{DbError, DbResult};

/// A new product to insert.
///
/// The repository generates the UUID and timestamps.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: CurrencyCode,
}

/// Repository for product catalog operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Fetches a product by its UUID.
    ///
    /// Returns `DbError::NotFound` if no such product exists. Inactive
    /// products are still returned - old order lines need them.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Fetches a product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// Fetches a product together with its variants.
    pub async fn get_with_variants(&self, id: &str) -> DbResult<(Product, Vec<ProductVariant>)> {
        let product = self.get_by_id(id).await?;

        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = ? ORDER BY name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok((product, variants))
    }

    /// Lists active products for the storefront, newest first.
    pub async fn list_active(&self, limit: i64, offset: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products
             WHERE is_active = 1
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Searches active products by name or SKU substring.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products
             WHERE is_active = 1 AND (name LIKE ? OR sku LIKE ?)
             ORDER BY name
             LIMIT ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product and returns it.
    ///
    /// Fails with `DbError::UniqueViolation` on a duplicate SKU.
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO products
                (id, sku, name, description, price_cents, currency,
                 is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&new.sku)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(&new.currency)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(product_id = %id, sku = %new.sku, "Product created");
        self.get_by_id(&id).await
    }

    /// Inserts a variant for an existing product.
    pub async fn insert_variant(
        &self,
        product_id: &str,
        name: &str,
        price_cents: Option<i64>,
        stock: i64,
    ) -> DbResult<ProductVariant> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO product_variants (id, product_id, name, price_cents, stock, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(product_id)
        .bind(name)
        .bind(price_cents)
        .bind(stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("ProductVariant", &id))
    }

    /// Updates a product's listed price.
    pub async fn update_price(&self, id: &str, price_cents: i64) -> DbResult<Product> {
        let result = sqlx::query(
            "UPDATE products SET price_cents = ?, updated_at = ? WHERE id = ?",
        )
        .bind(price_cents)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, price_cents, "Product price updated");
        self.get_by_id(id).await
    }

    /// Sets or clears the product-level sale.
    ///
    /// Pass `None` for `discount` to clear an existing sale.
    pub async fn set_discount(
        &self,
        id: &str,
        discount: Option<(DiscountKind, i64)>,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> DbResult<Product> {
        let (kind, value) = match discount {
            Some((kind, value)) => (Some(kind), Some(value)),
            None => (None, None),
        };

        let result = sqlx::query(
            "UPDATE products SET
                discount_kind = ?,
                discount_value = ?,
                discount_starts_at = ?,
                discount_ends_at = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(kind)
        .bind(value)
        .bind(starts_at)
        .bind(ends_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product discount updated");
        self.get_by_id(id).await
    }

    /// Soft-deletes a product (hides it from the storefront).
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deactivated");
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

    fn new_product(sku: &str, price_cents: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            description: None,
            price_cents,
            currency: CurrencyCode::new("USD").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(new_product("TEE-001", 10_000)).await.unwrap();
        assert_eq!(created.sku, "TEE-001");
        assert_eq!(created.price_cents, 10_000);
        assert!(created.is_active);

        let fetched = repo.get_by_id(&created.id).await.unwrap();
        assert_eq!(fetched.sku, created.sku);

        let by_sku = repo.get_by_sku("TEE-001").await.unwrap();
        assert_eq!(by_sku.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(new_product("TEE-001", 10_000)).await.unwrap();
        let result = repo.insert(new_product("TEE-001", 12_000)).await;

        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_variants() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(new_product("TEE-001", 10_000)).await.unwrap();
        repo.insert_variant(&product.id, "XL", Some(12_000), 5)
            .await
            .unwrap();
        repo.insert_variant(&product.id, "M", None, 10).await.unwrap();

        let (_, variants) = repo.get_with_variants(&product.id).await.unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].name, "M"); // ordered by name
        assert_eq!(variants[0].price_cents, None);
    }

    #[tokio::test]
    async fn test_set_and_clear_discount() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(new_product("TEE-001", 10_000)).await.unwrap();

        let updated = repo
            .set_discount(&product.id, Some((DiscountKind::Percentage, 2500)), None, None)
            .await
            .unwrap();
        assert!(updated.discount().is_some());

        let cleared = repo
            .set_discount(&product.id, None, None, None)
            .await
            .unwrap();
        assert!(cleared.discount().is_none());
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_listing() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(new_product("TEE-001", 10_000)).await.unwrap();
        assert_eq!(repo.list_active(10, 0).await.unwrap().len(), 1);

        repo.deactivate(&product.id).await.unwrap();
        assert!(repo.list_active(10, 0).await.unwrap().is_empty());

        // still fetchable by id for old order lines
        assert!(repo.get_by_id(&product.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_search() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(NewProduct {
            sku: "TEE-001".to_string(),
            name: "Basic Tee".to_string(),
            description: None,
            price_cents: 10_000,
            currency: CurrencyCode::new("USD").unwrap(),
        })
        .await
        .unwrap();
        repo.insert(NewProduct {
            sku: "MUG-001".to_string(),
            name: "Coffee Mug".to_string(),
            description: None,
            price_cents: 1_500,
            currency: CurrencyCode::new("USD").unwrap(),
        })
        .await
        .unwrap();

        let hits = repo.search("tee", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "TEE-001");
    }
}
