//! # Application Configuration
//!
//! Storefront-wide settings: the reporting currency, tax and shipping
//! parameters, and the database location.
//!
//! ## Sources
//! Defaults, overridden by `VITRIN_*` environment variables:
//!
//! ```text
//! VITRIN_REPORTING_CURRENCY             3-letter code   (default TRY)
//! VITRIN_TAX_RATE_BPS                   basis points    (default 0)
//! VITRIN_SHIPPING_FEE_CENTS             minor units     (default 0)
//! VITRIN_FREE_SHIPPING_THRESHOLD_CENTS  minor units     (default unset)
//! VITRIN_DATABASE_PATH                  file path       (default ./vitrin.db)
//! ```

use std::env;
use std::path::PathBuf;

use vitrin_core::validation::validate_tax_rate_bps;
use vitrin_core::{CurrencyCode, Money};

use crate::error::{CheckoutError, CheckoutResult};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The single currency all storefront amounts are resolved into.
    pub reporting_currency: CurrencyCode,

    /// Tax rate in basis points, applied to the discounted subtotal.
    pub tax_rate_bps: i64,

    /// Flat shipping fee in reporting-currency minor units.
    pub shipping_fee_cents: i64,

    /// Discounted subtotal at or above which shipping is free.
    pub free_shipping_threshold_cents: Option<i64>,

    /// SQLite database file location.
    pub database_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            reporting_currency: CurrencyCode::new("TRY")
                .unwrap_or_else(|_| unreachable!("TRY is a valid code")),
            tax_rate_bps: 0,
            shipping_fee_cents: 0,
            free_shipping_threshold_cents: None,
            database_path: PathBuf::from("./vitrin.db"),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from defaults plus `VITRIN_*` overrides.
    pub fn from_env() -> CheckoutResult<Self> {
        let mut config = AppConfig::default();

        if let Ok(code) = env::var("VITRIN_REPORTING_CURRENCY") {
            config.reporting_currency = CurrencyCode::new(&code)
                .map_err(|e| CheckoutError::Config(format!("VITRIN_REPORTING_CURRENCY: {}", e)))?;
        }

        if let Ok(raw) = env::var("VITRIN_TAX_RATE_BPS") {
            config.tax_rate_bps = parse_i64("VITRIN_TAX_RATE_BPS", &raw)?;
        }

        if let Ok(raw) = env::var("VITRIN_SHIPPING_FEE_CENTS") {
            config.shipping_fee_cents = parse_i64("VITRIN_SHIPPING_FEE_CENTS", &raw)?;
        }

        if let Ok(raw) = env::var("VITRIN_FREE_SHIPPING_THRESHOLD_CENTS") {
            config.free_shipping_threshold_cents =
                Some(parse_i64("VITRIN_FREE_SHIPPING_THRESHOLD_CENTS", &raw)?);
        }

        if let Ok(path) = env::var("VITRIN_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> CheckoutResult<()> {
        validate_tax_rate_bps(self.tax_rate_bps)
            .map_err(|e| CheckoutError::Config(e.to_string()))?;

        if self.shipping_fee_cents < 0 {
            return Err(CheckoutError::Config(
                "shipping fee cannot be negative".to_string(),
            ));
        }

        if let Some(threshold) = self.free_shipping_threshold_cents {
            if threshold < 0 {
                return Err(CheckoutError::Config(
                    "free-shipping threshold cannot be negative".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// The shipping fee for a discounted subtotal.
    ///
    /// Waived at or above the free-shipping threshold.
    pub fn shipping_for(&self, discounted_subtotal: Money) -> Money {
        match self.free_shipping_threshold_cents {
            Some(threshold) if discounted_subtotal.cents() >= threshold => Money::zero(),
            _ => Money::from_cents(self.shipping_fee_cents),
        }
    }
}

fn parse_i64(name: &str, raw: &str) -> CheckoutResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| CheckoutError::Config(format!("{}: '{}' is not an integer", name, raw)))
}

// =============================================================================
// Unit Tests
// =============================================================================
