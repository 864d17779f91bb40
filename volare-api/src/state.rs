use std::sync::Arc;

use volare_core::repository::{BookingRepository, InquiryRepository, QuoteRepository};
use volare_lifecycle::CharterLifecycle;
use volare_store::app_config::BusinessRules;
use volare_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<CharterLifecycle>,
    pub inquiries: Arc<dyn InquiryRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub redis: Arc<RedisClient>,
    pub auth: AuthConfig,
    pub webhook_secret: String,
    pub business_rules: BusinessRules,
}
