use std::sync::Arc;

use super::auth::TokenKeys;
use crate::adapters::{MemoryStore, MongoStore, StripeGateway};
use crate::config::{Settings, StoreKind};
use crate::domain::ports::{CouponStore, PaymentGateway, ProductStore, ReviewStore, UserStore};
use crate::utils::error::{AppError, Result};

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub coupons: Arc<dyn CouponStore>,
    pub users: Arc<dyn UserStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub payments: Option<Arc<dyn PaymentGateway>>,
    pub currency: String,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    /// Wires every store port to the same backing store.
    pub fn new<S>(store: Arc<S>, tokens: TokenKeys) -> Self
    where
        S: ProductStore + CouponStore + UserStore + ReviewStore + 'static,
    {
        Self {
            products: store.clone(),
            coupons: store.clone(),
            users: store.clone(),
            reviews: store,
            payments: None,
            currency: crate::config::DEFAULT_CURRENCY.to_string(),
            tokens: Arc::new(tokens),
        }
    }

    pub fn with_payments(mut self, gateway: Arc<dyn PaymentGateway>, currency: &str) -> Self {
        self.payments = Some(gateway);
        self.currency = currency.to_string();
        self
    }

    pub fn payment_gateway(&self) -> Result<&dyn PaymentGateway> {
        self.payments.as_deref().ok_or(AppError::PaymentUnavailable)
    }

    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let tokens = TokenKeys::new(&settings.token_secret, settings.token_ttl_hours)
            .with_issuer_key(settings.token_issuer_key.clone());
        if settings.token_issuer_key.is_none() {
            tracing::warn!("Token issuer key not set, POST /jwt is disabled");
        }

        let state = match settings.store {
            StoreKind::Mongo => {
                let uri = settings
                    .database_uri
                    .as_deref()
                    .ok_or_else(|| AppError::MissingConfigError {
                        field: "database.uri".to_string(),
                    })?;
                let store = MongoStore::connect(uri, &settings.database_name).await?;
                Self::new(Arc::new(store), tokens)
            }
            StoreKind::Memory => {
                tracing::warn!("⚠️ Using in-memory store, data is lost on restart");
                Self::new(Arc::new(MemoryStore::new()), tokens)
            }
        };

        match &settings.payment_secret_key {
            Some(key) => {
                let gateway = StripeGateway::new(&settings.payment_api_base, key);
                Ok(state.with_payments(Arc::new(gateway), &settings.currency))
            }
            None => {
                tracing::warn!("Payment secret key not set, payment intents are disabled");
                Ok(state)
            }
        }
    }
}
