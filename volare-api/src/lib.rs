use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::Method,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod inquiries;
pub mod middleware;
pub mod quotes;
pub mod state;
pub mod webhooks;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let customer_routes = Router::new()
        .route("/v1/inquiries", post(inquiries::submit_inquiry))
        .route("/v1/inquiries", get(inquiries::list_inquiries))
        .route("/v1/inquiries/{id}/quotes", get(quotes::list_quotes))
        .route("/v1/quotes/{id}/accept", post(quotes::accept_quote))
        .route("/v1/bookings", get(bookings::list_bookings))
        .route("/v1/bookings/{id}", get(bookings::get_booking))
        .route("/v1/bookings/{id}/checkout", post(bookings::start_checkout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::customer_auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/v1/admin/quotes", post(admin::issue_quote))
        .route("/v1/admin/inquiries/{id}/close", post(admin::close_inquiry))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::admin_auth_middleware,
        ));

    let webhook_routes = Router::new().route(
        "/v1/webhooks/payments",
        post(webhooks::handle_payment_webhook),
    );

    Router::new()
        .merge(auth::routes())
        .merge(customer_routes)
        .merge(admin_routes)
        .merge(webhook_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    // ConnectInfo is absent when the router is driven without a real
    // socket (tests); fail open in that case.
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied()
    else {
        return Ok(next.run(req).await);
    };

    let key = format!("ratelimit:{}", addr.ip());

    match state.redis.check_rate_limit(&key, 100, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
        )),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
