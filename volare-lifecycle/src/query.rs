use chrono::{DateTime, Utc};
use serde::Serialize;

use volare_core::booking::{Booking, BookingStatus, PaymentState};
use volare_core::inquiry::{Inquiry, InquiryStatus};
use volare_core::quote::{Quote, QuoteStatus};

/// One page of a result set, 1-indexed.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Slice `items` into the requested page. `total_pages` is
/// `ceil(len / page_size)`; pages outside the range (including page 0)
/// return an empty slice rather than failing.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len() as u32;
    let total_pages = total.div_ceil(page_size);

    let in_range = page >= 1 && page <= total_pages;
    let slice = if in_range {
        let start = ((page - 1) * page_size) as usize;
        let end = (start + page_size as usize).min(items.len());
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items: slice,
        current_page: page,
        total_pages,
        has_next: in_range && page < total_pages,
        has_prev: in_range && page > 1,
    }
}

fn matches_search(needle: &str, haystacks: &[&str]) -> bool {
    let needle = needle.to_lowercase();
    haystacks
        .iter()
        .any(|h| h.to_lowercase().contains(&needle))
}

fn within(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |f| at >= f) && to.map_or(true, |t| at <= t)
}

/// Pure, composable filter applied before pagination. Text search is
/// case-insensitive substring matching over the route endpoints.
#[derive(Debug, Clone, Default)]
pub struct InquiryFilter {
    pub status: Option<InquiryStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl InquiryFilter {
    pub fn matches(&self, inquiry: &Inquiry) -> bool {
        self.status.map_or(true, |s| inquiry.status == s)
            && within(inquiry.departure_at, self.from, self.to)
            && self.search.as_deref().map_or(true, |needle| {
                matches_search(needle, &[&inquiry.origin, &inquiry.destination])
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub search: Option<String>,
}

impl QuoteFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        self.status.map_or(true, |s| quote.status == s)
            && self
                .search
                .as_deref()
                .map_or(true, |needle| matches_search(needle, &[&quote.aircraft, &quote.operator]))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub payment_state: Option<PaymentState>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.status == s)
            && self.payment_state.map_or(true, |p| booking.payment_state == p)
            && within(booking.flight.departure_at, self.from, self.to)
            && self.search.as_deref().map_or(true, |needle| {
                matches_search(
                    needle,
                    &[
                        &booking.booking_reference,
                        &booking.flight.origin,
                        &booking.flight.destination,
                        &booking.flight.aircraft,
                        &booking.flight.operator,
                    ],
                )
            })
    }
}
