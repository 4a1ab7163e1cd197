//! Runtime wiring: stores, token signer, payment processor.

use std::sync::Arc;

use thiserror::Error;

use academy_auth::Hs256Jwt;
use academy_infra::{
    AppConfig, BootstrapError, DisabledGateway, PaymentError, PaymentGateway, StoreError, Stores, StripeGateway,
    ensure_admin,
};

/// Everything a handler needs, created once at start-up and shared.
#[derive(Clone)]
pub struct AppServices {
    pub stores: Stores,
    pub tokens: Arc<Hs256Jwt>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppServices {
    pub fn new(stores: Stores, token_secret: &str, payments: Arc<dyn PaymentGateway>) -> Self {
        Self {
            stores,
            tokens: Arc::new(Hs256Jwt::new(token_secret)),
            payments,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open stores: {0}")]
    Store(#[from] StoreError),

    #[error("failed to configure payments: {0}")]
    Payment(#[from] PaymentError),

    #[error("failed to bootstrap admin: {0}")]
    Bootstrap(#[from] BootstrapError),
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let stores = match &config.database_url {
        Some(url) => {
            tracing::info!("using postgres stores");
            Stores::postgres(url).await?
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Stores::in_memory()
        }
    };

    let payments: Arc<dyn PaymentGateway> = match &config.payment_secret_key {
        Some(key) => Arc::new(StripeGateway::new(key.clone())?),
        None => {
            tracing::warn!("PAYMENT_SECRET_KEY not set; payment intents are disabled");
            Arc::new(DisabledGateway)
        }
    };

    if let Some(email) = &config.bootstrap_admin_email {
        ensure_admin(stores.users.as_ref(), email).await?;
    }

    Ok(AppServices::new(stores, &config.token_secret, payments))
}
