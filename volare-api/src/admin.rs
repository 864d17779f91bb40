use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use volare_core::quote::{Quote, QuoteStatus};

use crate::{error::AppError, middleware::auth::AdminClaims, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IssueQuoteRequest {
    pub inquiry_id: Uuid,
    pub aircraft: String,
    pub operator: String,
    pub base_cents: i64,
    pub taxes_cents: i64,
    pub fees_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub valid_until: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_owned()
}

/// POST /v1/admin/quotes
/// Issue a quote against an inquiry. Advances the inquiry to QUOTED.
pub async fn issue_quote(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(req): Json<IssueQuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let now = Utc::now();
    let valid_until = req
        .valid_until
        .unwrap_or_else(|| now + Duration::hours(state.business_rules.quote_validity_hours));

    let quote = Quote {
        id: Uuid::new_v4(),
        inquiry_id: req.inquiry_id,
        aircraft: req.aircraft,
        operator: req.operator,
        base_cents: req.base_cents,
        taxes_cents: req.taxes_cents,
        fees_cents: req.fees_cents,
        total_cents: req.base_cents + req.taxes_cents + req.fees_cents,
        currency: req.currency,
        valid_until,
        status: QuoteStatus::Pending,
        created_at: now,
    };

    let quote = state
        .lifecycle
        .issue_quote(&claims.identity(), quote)
        .await?;
    Ok(Json(quote))
}

/// POST /v1/admin/inquiries/{id}/close
/// Close an inquiry that did not convert
pub async fn close_inquiry(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(inquiry_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .lifecycle
        .close_inquiry(&claims.identity(), inquiry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
