use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use volare_core::inquiry::{Inquiry, InquiryDraft, InquiryStatus};
use volare_lifecycle::query::{paginate, InquiryFilter, Page};

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListInquiriesParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// POST /v1/inquiries
/// Submit a new charter inquiry
pub async fn submit_inquiry(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(draft): Json<InquiryDraft>,
) -> Result<Json<Inquiry>, AppError> {
    let inquiry = state
        .lifecycle
        .submit_inquiry(&claims.identity(), draft)
        .await?;
    Ok(Json(inquiry))
}

/// GET /v1/inquiries
/// List the caller's inquiries, filtered and paginated
pub async fn list_inquiries(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Query(params): Query<ListInquiriesParams>,
) -> Result<Json<Page<Inquiry>>, AppError> {
    let filter = InquiryFilter {
        status: params.status.as_deref().and_then(InquiryStatus::parse),
        from: params.from,
        to: params.to,
        search: params.search,
    };

    let inquiries: Vec<Inquiry> = state
        .inquiries
        .list_inquiries(&claims.sub)
        .await
        .map_err(volare_core::LifecycleError::from)?
        .into_iter()
        .filter(|i| filter.matches(i))
        .collect();

    let page_size = params
        .page_size
        .unwrap_or(state.business_rules.default_page_size)
        .min(state.business_rules.max_page_size);
    Ok(Json(paginate(
        &inquiries,
        params.page.unwrap_or(1),
        page_size,
    )))
}
