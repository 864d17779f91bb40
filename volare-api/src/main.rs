use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volare_api::{
    app,
    state::{AppState, AuthConfig},
};
use volare_core::payment::{CheckoutGateway, MockCheckoutGateway};
use volare_core::repository::{
    AuditLog, BookingRepository, InquiryRepository, PaymentRepository, QuoteRepository,
};
use volare_lifecycle::manager::{CharterLifecycle, CheckoutUrls};
use volare_store::{
    audit_repo::PgAuditLog, booking_repo::PgBookingRepository, inquiry_repo::PgInquiryRepository,
    payment_repo::PgPaymentRepository, quote_repo::PgQuoteRepository, DbClient, RedisClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "volare_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = volare_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Volare API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let redis =
        Arc::new(RedisClient::new(&config.redis.url).context("Failed to open Redis client")?);

    let inquiries: Arc<dyn InquiryRepository> = Arc::new(PgInquiryRepository::new(db.pool.clone()));
    let quotes: Arc<dyn QuoteRepository> = Arc::new(PgQuoteRepository::new(db.pool.clone()));
    let bookings: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(db.pool.clone()));
    let payments: Arc<dyn PaymentRepository> = Arc::new(PgPaymentRepository::new(db.pool.clone()));
    let audit: Arc<dyn AuditLog> = Arc::new(PgAuditLog::new(db.pool.clone()));

    // Sandbox gateway; a production build swaps in the live adapter here.
    let checkout: Arc<dyn CheckoutGateway> = Arc::new(MockCheckoutGateway::new());

    let lifecycle = Arc::new(CharterLifecycle::new(
        inquiries.clone(),
        quotes.clone(),
        bookings.clone(),
        payments,
        audit,
        checkout,
        CheckoutUrls {
            success_url: config.payment.success_url.clone(),
            cancel_url: config.payment.cancel_url.clone(),
        },
    ));

    let app_state = AppState {
        lifecycle,
        inquiries,
        quotes,
        bookings,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        webhook_secret: config.payment.webhook_secret.clone(),
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
