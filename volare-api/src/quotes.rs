use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use volare_core::booking::Booking;
use volare_core::quote::Quote;
use volare_core::LifecycleError;

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

/// GET /v1/inquiries/{id}/quotes
/// List quotes issued against one of the caller's inquiries
pub async fn list_quotes(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(inquiry_id): Path<Uuid>,
) -> Result<Json<Vec<Quote>>, AppError> {
    let inquiry = state
        .inquiries
        .get_inquiry(inquiry_id)
        .await
        .map_err(LifecycleError::from)?
        .ok_or(LifecycleError::NotFound)?;

    if inquiry.customer_id != claims.sub {
        return Err(LifecycleError::Authorization.into());
    }

    let quotes = state
        .quotes
        .list_quotes_for_inquiry(inquiry_id)
        .await
        .map_err(LifecycleError::from)?;
    Ok(Json(quotes))
}

/// POST /v1/quotes/{id}/accept
/// Accept a quote, creating the booking
pub async fn accept_quote(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle
        .accept_quote(&claims.identity(), quote_id)
        .await?;
    Ok(Json(booking))
}
