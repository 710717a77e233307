//! # Exchange Rate Repository
//!
//! Daily exchange-rate persistence.
//!
//! ## Write Model
//! An admin posts one rate per currency per day. The table has a
//! `UNIQUE (currency, effective_date)` constraint and writes go through an
//! upsert, so re-posting the same day's rate replaces it instead of failing.
//!
//! ## Read Model
//! The storefront loads the whole day at once via [`table_for_date`] and
//! resolves prices in memory against the returned [`RateTable`].
//!
//! [`table_for_date`]: ExchangeRateRepository::table_for_date

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use vitrin_core::{CurrencyCode, ExchangeRate, RateTable};

use crate::error::DbResult;

/// Repository for exchange-rate operations.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    pool: SqlitePool,
}

impl ExchangeRateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExchangeRateRepository { pool }
    }

    /// Inserts or replaces the rate for (currency, effective_date).
    ///
    /// The daily admin action: posting a corrected rate for the same day
    /// overwrites the earlier one.
    pub async fn upsert(&self, rate: &ExchangeRate) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO exchange_rates (currency, rate_micros, effective_date, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (currency, effective_date)
             DO UPDATE SET rate_micros = excluded.rate_micros,
                           updated_at = excluded.updated_at",
        )
        .bind(&rate.currency)
        .bind(rate.rate_micros)
        .bind(rate.effective_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(
            currency = %rate.currency,
            rate_micros = rate.rate_micros,
            date = %rate.effective_date,
            "Exchange rate upserted"
        );
        Ok(())
    }

    /// Returns the rate for one currency on one date, if posted.
    pub async fn get(
        &self,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> DbResult<Option<ExchangeRate>> {
        let rate = sqlx::query_as::<_, ExchangeRate>(
            "SELECT currency, rate_micros, effective_date
             FROM exchange_rates
             WHERE currency = ? AND effective_date = ?",
        )
        .bind(currency)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }

    /// Lists all rates posted for a date.
    pub async fn list_for_date(&self, date: NaiveDate) -> DbResult<Vec<ExchangeRate>> {
        let rates = sqlx::query_as::<_, ExchangeRate>(
            "SELECT currency, rate_micros, effective_date
             FROM exchange_rates
             WHERE effective_date = ?
             ORDER BY currency",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        debug!(date = %date, count = rates.len(), "Loaded exchange rates");
        Ok(rates)
    }

    /// Builds the day's in-memory rate table against a reporting currency.
    ///
    /// Missing currencies are simply absent from the table; resolving them
    /// yields `ResolvedPrice::Unconverted`, never an error.
    pub async fn table_for_date(
        &self,
        reporting: CurrencyCode,
        date: NaiveDate,
    ) -> DbResult<RateTable> {
        let rates = self.list_for_date(date).await?;
        Ok(RateTable::from_rates(reporting, date, &rates))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
