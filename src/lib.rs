pub mod billing;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod planning;
pub mod routes;
pub mod schema;
pub mod services;
pub mod utils;
pub mod validation;
pub mod websocket;

use crate::billing::{HttpRateProvider, PricingPlan, RateProvider};
use crate::config::Config;
use crate::db::DbPool;
use crate::middleware::auth::AuthService;
use crate::notifications::Notifier;
use crate::utils::SignedUrlSigner;
use crate::websocket::WebSocketManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub redis: redis::Client,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub signer: SignedUrlSigner,
    pub notifier: Notifier,
    pub rate_provider: Arc<dyn RateProvider>,
    pub pricing: Arc<PricingPlan>,
    pub ws_manager: WebSocketManager,
}

impl AppState {
    pub fn new(db: DbPool, redis: redis::Client, config: Config) -> Self {
        let rates = config.exchange_rates();
        let billing = config.billing();
        Self {
            auth_service: AuthService::new(config.auth()),
            signer: SignedUrlSigner::new(&config.jwt_secret, config.download_link_expires_in),
            notifier: Notifier::from_config(config.sms()),
            rate_provider: Arc::new(HttpRateProvider::new(rates.api_url)),
            pricing: Arc::new(PricingPlan::standard(billing.currency, billing.annual_discount_percent)),
            ws_manager: WebSocketManager::new(),
            db,
            redis,
            config: Arc::new(config),
        }
    }

    /// Replaces the exchange-rate provider, e.g. with a fixed one in tests.
    pub fn with_rate_provider(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.rate_provider = provider;
        self
    }
}

pub fn init_tracing(config: &Config) {
    let logging = config.logging();
    let level = match logging.level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt().json().with_max_level(level).init();
        }
        _ => {
            tracing_subscriber::fmt().with_max_level(level).init();
        }
    }
}
