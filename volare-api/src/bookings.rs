use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use volare_core::booking::{Booking, BookingStatus, PaymentState};
use volare_core::LifecycleError;
use volare_lifecycle::manager::CheckoutInit;
use volare_lifecycle::query::{paginate, BookingFilter, Page};

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListBookingsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
    pub payment_state: Option<String>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// GET /v1/bookings
/// List the caller's bookings, filtered and paginated
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Query(params): Query<ListBookingsParams>,
) -> Result<Json<Page<Booking>>, AppError> {
    let filter = BookingFilter {
        status: params.status.as_deref().and_then(BookingStatus::parse),
        payment_state: params
            .payment_state
            .as_deref()
            .and_then(PaymentState::parse),
        from: params.from,
        to: params.to,
        search: params.search,
    };

    let bookings: Vec<Booking> = state
        .bookings
        .list_bookings(&claims.sub)
        .await
        .map_err(LifecycleError::from)?
        .into_iter()
        .filter(|b| filter.matches(b))
        .collect();

    let page_size = params
        .page_size
        .unwrap_or(state.business_rules.default_page_size)
        .min(state.business_rules.max_page_size);
    Ok(Json(paginate(
        &bookings,
        params.page.unwrap_or(1),
        page_size,
    )))
}

/// GET /v1/bookings/{id}
/// Retrieve one of the caller's bookings
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await
        .map_err(LifecycleError::from)?
        .ok_or(LifecycleError::NotFound)?;

    if booking.customer_id != claims.sub {
        return Err(LifecycleError::Authorization.into());
    }

    Ok(Json(booking))
}

/// POST /v1/bookings/{id}/checkout
/// Start (or resume) checkout for a booking
pub async fn start_checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CheckoutInit>, AppError> {
    let init = state
        .lifecycle
        .initiate_payment(&claims.identity(), booking_id)
        .await?;
    Ok(Json(init))
}
