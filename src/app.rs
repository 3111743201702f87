//! Composition root: builds the services once and registers them with actix-web.

use std::sync::Arc;

use actix_web::web;
use sqlx::MySqlPool;

use crate::config::{Config, ConfirmationMode, LedgerBackend};
use crate::core::{AppError, EnrollmentLocks, Result, SchoolClock};
use crate::middleware::error_handler;
use crate::modules::{
    fee_plans::{
        self,
        repositories::{EnrollmentCatalog, InMemoryCatalog, MySqlCatalog},
        services::FeePlanResolver,
    },
    health,
    ledger::repositories::{InMemoryLedger, MySqlLedger, TransactionLedger},
    payments::{
        self,
        services::{
            CallbackProvider, CallbackVerifier, PaymentProvider, PaymentService,
            PreAuthorizedProvider,
        },
    },
    reconciliation::{self, services::ReconciliationService},
};

/// Shared application services
#[derive(Clone)]
pub struct AppServices {
    pub resolver: FeePlanResolver,
    pub payments: PaymentService,
    pub reconciliation: ReconciliationService,
    pub verifier: CallbackVerifier,
    pub pool: Option<MySqlPool>,
}

impl AppServices {
    /// Wire services over explicit backends
    pub fn new(
        catalog: Arc<dyn EnrollmentCatalog>,
        ledger: Arc<dyn TransactionLedger>,
        provider: Arc<dyn PaymentProvider>,
        clock: SchoolClock,
        verifier: CallbackVerifier,
    ) -> Self {
        let resolver = FeePlanResolver::new(catalog);
        let payments = PaymentService::new(
            resolver.clone(),
            ledger.clone(),
            provider,
            EnrollmentLocks::new(),
        );
        let reconciliation = ReconciliationService::new(resolver.clone(), ledger, clock);

        Self {
            resolver,
            payments,
            reconciliation,
            verifier,
            pool: None,
        }
    }

    /// Build from configuration, connecting and migrating MySQL when selected
    pub async fn from_config(config: &Config) -> Result<Self> {
        let clock = config.school_clock().ok_or_else(|| {
            AppError::Configuration("SCHOOL_UTC_OFFSET_HOURS out of range".to_string())
        })?;
        let verifier = CallbackVerifier::new(config.provider.callback_secret.as_bytes());

        let provider: Arc<dyn PaymentProvider> = match config.provider.confirmation {
            ConfirmationMode::Immediate => Arc::new(PreAuthorizedProvider),
            ConfirmationMode::Callback => Arc::new(CallbackProvider),
        };

        match config.ledger.backend {
            LedgerBackend::Mysql => {
                let pool = config.database.create_pool().await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!(
                    pool_size = config.database.pool_size,
                    "MySQL ledger ready, migrations applied"
                );

                let mut services = Self::new(
                    Arc::new(MySqlCatalog::new(pool.clone())),
                    Arc::new(MySqlLedger::new(pool.clone())),
                    provider,
                    clock,
                    verifier,
                );
                services.pool = Some(pool);
                Ok(services)
            }
            LedgerBackend::Memory => {
                let catalog = match &config.ledger.catalog_seed_file {
                    Some(path) => {
                        tracing::info!(seed = path.as_str(), "Loading catalog seed");
                        InMemoryCatalog::from_seed_file(path)?
                    }
                    None => {
                        tracing::warn!("In-memory backend without CATALOG_SEED_FILE; catalog is empty");
                        InMemoryCatalog::new()
                    }
                };
                tracing::warn!("In-memory ledger selected; entries are lost on restart");

                Ok(Self::new(
                    Arc::new(catalog),
                    Arc::new(InMemoryLedger::new()),
                    provider,
                    clock,
                    verifier,
                ))
            }
        }
    }

    /// Register shared data and every route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.resolver.clone()))
            .app_data(web::Data::new(self.payments.clone()))
            .app_data(web::Data::new(self.reconciliation.clone()))
            .app_data(web::Data::new(self.verifier.clone()));

        if let Some(pool) = &self.pool {
            cfg.app_data(web::Data::new(pool.clone()));
        }

        error_handler::configure(cfg);
        health::configure(cfg);
        fee_plans::controllers::configure(cfg);
        payments::controllers::configure(cfg);
        reconciliation::controllers::configure(cfg);
    }
}
