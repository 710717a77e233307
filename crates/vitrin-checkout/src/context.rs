//! # Application Context
//!
//! The single composition root: configuration plus the database handle,
//! built once at startup and passed (cloned) to whatever serves the
//! storefront. No global singletons; everything reachable from here.
//!
//! ## Lifecycle
//! ```text
//! init_tracing()            once, before anything logs
//! AppContext::init(config)  validate config, open pool, run migrations
//!     ... serve ...
//! ctx.shutdown()            drain and close the pool
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;

use vitrin_db::{Database, DbConfig};

use crate::checkout::CheckoutService;
use crate::config::AppConfig;
use crate::error::CheckoutResult;
use crate::payment::{AutoApproveGateway, PaymentGateway};

/// Initializes the global tracing subscriber.
///
/// Reads `RUST_LOG` for the filter, defaulting to `info`. Safe to call
/// more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// The application context: configuration and database, wired together.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: AppConfig,
    db: Database,
}

impl AppContext {
    /// Validates the configuration, opens the database, and runs
    /// migrations.
    pub async fn init(config: AppConfig) -> CheckoutResult<Self> {
        config.validate()?;

        info!(
            reporting = %config.reporting_currency,
            db = %config.database_path.display(),
            "Initializing application context"
        );

        let db = Database::new(DbConfig::new(config.database_path.clone())).await?;

        Ok(AppContext { config, db })
    }

    /// An in-memory context for tests and demos.
    pub async fn init_in_memory(config: AppConfig) -> CheckoutResult<Self> {
        config.validate()?;
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(AppContext { config, db })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Builds a checkout service with the default auto-approving gateway.
    pub fn checkout(&self) -> CheckoutService<AutoApproveGateway> {
        CheckoutService::new(self.db.clone(), self.config.clone())
    }

    /// Builds a checkout service with a specific payment gateway.
    pub fn checkout_with<G: PaymentGateway>(&self, gateway: G) -> CheckoutService<G> {
        CheckoutService::with_gateway(self.db.clone(), self.config.clone(), gateway)
    }

    /// Closes the database pool.
    pub async fn shutdown(&self) {
        info!("Shutting down application context");
        self.db.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_context_lifecycle() {
        let ctx = AppContext::init_in_memory(AppConfig::default()).await.unwrap();

        assert!(ctx.db().health_check().await);
        assert_eq!(ctx.config().reporting_currency.as_str(), "TRY");

        ctx.shutdown().await;
        assert!(!ctx.db().health_check().await);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = AppConfig {
            tax_rate_bps: -5,
            ..AppConfig::default()
        };

        assert!(AppContext::init_in_memory(config).await.is_err());
    }
}
