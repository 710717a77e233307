//! # Currency & Price Resolution
//!
//! Converts stored prices into the reporting currency using a daily
//! exchange-rate table.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Price Resolution                                    │
//! │                                                                         │
//! │  Product stored as (100.00, USD), reporting currency TRY               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RateTable::resolve(amount, currency)                                  │
//! │       │                                                                 │
//! │       ├── currency == reporting? ──► Converted (rate = 1.0)            │
//! │       │                                                                 │
//! │       ├── rate on file for today? ─► Converted { amount × rate }       │
//! │       │                                                                 │
//! │       └── no rate loaded ──────────► Unconverted { original amount }   │
//! │                                      (caller shows a warning; never    │
//! │                                       an error, never a silent fall-   │
//! │                                       back the caller can't see)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rate Representation
//! Rates are integers scaled by [`RATE_SCALE`] (micros): a rate of 32.5 is
//! stored as `32_500_000`. Conversion widens to i128 and rounds half up,
//! so `100.00 USD × 32.5` is exactly `3250.00` in the reporting currency.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Scale factor for integer exchange rates: 1.0 == 1_000_000 micros.
pub const RATE_SCALE: i64 = 1_000_000;

// =============================================================================
// Currency Code
// =============================================================================

/// A three-letter ISO-4217-style currency code, stored uppercase.
///
/// ## Example
/// ```rust
/// use vitrin_core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("usd").unwrap();
/// assert_eq!(usd.as_str(), "USD");
/// assert!(CurrencyCode::new("EURO").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// ## Rules
    /// - Exactly 3 characters
    /// - ASCII letters only
    /// - Normalized to uppercase
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            });
        }

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be a 3-letter ISO 4217 code".to_string(),
            });
        }

        Ok(CurrencyCode(code.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// A single daily exchange rate: how many reporting-currency units one unit
/// of `currency` is worth, in micros.
///
/// ## Lifecycle
/// Inserted or updated once per day by an admin action; read-only to the
/// storefront. At most one rate exists per (currency, effective_date) pair,
/// enforced by a UNIQUE constraint in vitrin-db.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExchangeRate {
    /// Source currency this rate converts from.
    pub currency: CurrencyCode,

    /// Rate to the reporting currency, scaled by [`RATE_SCALE`].
    pub rate_micros: i64,

    /// Calendar date this rate applies to.
    #[ts(as = "String")]
    pub effective_date: NaiveDate,
}

// =============================================================================
// Resolved Price
// =============================================================================

/// Outcome of resolving a stored price into the reporting currency.
///
/// A missing rate is not an error and not a silent identity return: it is
/// this explicit variant, so callers can render the raw amount and warn the
/// user that conversion is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export)]
pub enum ResolvedPrice {
    /// Price is in the reporting currency (converted, or already there).
    Converted {
        /// Amount in reporting-currency minor units.
        amount: Money,
        /// Rate used, in micros. [`RATE_SCALE`] when no conversion was needed.
        rate_micros: i64,
    },

    /// No rate was on file for the price's currency; amount is unconverted.
    Unconverted {
        /// The original, unconverted amount.
        amount: Money,
        /// The currency the amount is still denominated in.
        currency: CurrencyCode,
    },
}

impl ResolvedPrice {
    /// Returns the amount, converted or not.
    #[inline]
    pub fn amount(&self) -> Money {
        match self {
            ResolvedPrice::Converted { amount, .. } => *amount,
            ResolvedPrice::Unconverted { amount, .. } => *amount,
        }
    }

    /// True if the amount is in the reporting currency.
    #[inline]
    pub fn is_converted(&self) -> bool {
        matches!(self, ResolvedPrice::Converted { .. })
    }
}

// =============================================================================
// Rate Table
// =============================================================================

/// One day's exchange rates against a fixed reporting currency.
///
/// Built from the rows returned by
/// `ExchangeRateRepository::table_for_date`; refreshed once per day.
#[derive(Debug, Clone)]
pub struct RateTable {
    reporting: CurrencyCode,
    effective_date: NaiveDate,
    rates: HashMap<CurrencyCode, i64>,
}

impl RateTable {
    /// Creates an empty table for the given reporting currency and date.
    ///
    /// An empty table is valid: every foreign-currency resolution simply
    /// comes back [`ResolvedPrice::Unconverted`] until rates are loaded.
    pub fn new(reporting: CurrencyCode, effective_date: NaiveDate) -> Self {
        RateTable {
            reporting,
            effective_date,
            rates: HashMap::new(),
        }
    }

    /// Builds a table from one day's rate rows.
    ///
    /// Rows for other dates or for the reporting currency itself are
    /// skipped; the reporting currency always converts at identity.
    pub fn from_rates(
        reporting: CurrencyCode,
        effective_date: NaiveDate,
        rates: &[ExchangeRate],
    ) -> Self {
        let mut table = RateTable::new(reporting, effective_date);
        for rate in rates {
            table.insert(rate.clone());
        }
        table
    }

    /// Inserts a single rate, replacing any previous rate for its currency.
    pub fn insert(&mut self, rate: ExchangeRate) {
        if rate.effective_date != self.effective_date || rate.currency == self.reporting {
            return;
        }
        self.rates.insert(rate.currency, rate.rate_micros);
    }

    /// Returns the reporting currency.
    #[inline]
    pub fn reporting(&self) -> &CurrencyCode {
        &self.reporting
    }

    /// Returns the date this table applies to.
    #[inline]
    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    /// Returns the rate for a currency, if loaded.
    #[inline]
    pub fn rate_micros(&self, currency: &CurrencyCode) -> Option<i64> {
        self.rates.get(currency).copied()
    }

    /// Number of rates loaded.
    #[inline]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// True if no rates are loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Resolves a stored (amount, currency) pair into the reporting currency.
    ///
    /// ## Behavior
    /// - Same currency: identity, reported as `Converted` at [`RATE_SCALE`]
    /// - Rate on file: `amount × rate_micros / RATE_SCALE` (i128, round half up)
    /// - No rate: `Unconverted`, caller decides how to warn
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use vitrin_core::currency::{CurrencyCode, ExchangeRate, RateTable, RATE_SCALE};
    /// use vitrin_core::money::Money;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
    /// let table = RateTable::from_rates(
    ///     CurrencyCode::new("TRY").unwrap(),
    ///     date,
    ///     &[ExchangeRate {
    ///         currency: CurrencyCode::new("USD").unwrap(),
    ///         rate_micros: 32 * RATE_SCALE + 500_000, // 32.5
    ///         effective_date: date,
    ///     }],
    /// );
    ///
    /// let resolved = table.resolve(
    ///     Money::from_cents(10_000),
    ///     &CurrencyCode::new("USD").unwrap(),
    /// );
    /// assert_eq!(resolved.amount(), Money::from_cents(325_000)); // 3250.00 TRY
    /// ```
    pub fn resolve(&self, amount: Money, currency: &CurrencyCode) -> ResolvedPrice {
        if *currency == self.reporting {
            return ResolvedPrice::Converted {
                amount,
                rate_micros: RATE_SCALE,
            };
        }

        match self.rates.get(currency) {
            Some(&rate_micros) => {
                let converted =
                    (amount.cents() as i128 * rate_micros as i128 + RATE_SCALE as i128 / 2)
                        / RATE_SCALE as i128;
                ResolvedPrice::Converted {
                    amount: Money::from_cents(converted as i64),
                    rate_micros,
                }
            }
            None => ResolvedPrice::Unconverted {
                amount,
                currency: currency.clone(),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
