use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inquiry::Inquiry;
use crate::quote::Quote;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Scheduled,
    InFlight,
    Completed,
    Cancelled,
}

/// Settlement state of a booking. `Partial` exists in the data model as an
/// extension point for deposit flows but is never produced by this
/// subsystem; transitions only move forward and are driven solely by
/// confirmed payment outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Unpaid,
    Partial,
    Paid,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Scheduled => "SCHEDULED",
            BookingStatus::InFlight => "IN_FLIGHT",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "SCHEDULED" => Some(BookingStatus::Scheduled),
            "IN_FLIGHT" => Some(BookingStatus::InFlight),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Unpaid => "UNPAID",
            PaymentState::Partial => "PARTIAL",
            PaymentState::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(PaymentState::Unpaid),
            "PARTIAL" => Some(PaymentState::Partial),
            "PAID" => Some(PaymentState::Paid),
            _ => None,
        }
    }
}

/// Flight details copied onto the booking at acceptance time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDetails {
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub return_at: Option<DateTime<Utc>>,
    pub aircraft: String,
    pub operator: String,
}

/// A confirmed commercial commitment created the moment a Quote is accepted.
///
/// `total_cents` equals the quote's total at creation and is immune to later
/// quote edits. `payment_state` is mutated only by confirmed payment
/// transaction outcomes, never directly by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_reference: String,
    pub quote_id: Uuid,
    pub customer_id: String,
    pub total_cents: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub payment_state: PaymentState,
    pub flight: FlightDetails,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Build the booking for an acceptance, freezing the quote's price at
    /// this instant.
    pub fn from_acceptance(quote: &Quote, inquiry: &Inquiry, booking_reference: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_reference,
            quote_id: quote.id,
            customer_id: inquiry.customer_id.clone(),
            total_cents: quote.total_cents,
            currency: quote.currency.clone(),
            status: BookingStatus::Confirmed,
            payment_state: PaymentState::Unpaid,
            flight: FlightDetails {
                origin: inquiry.origin.clone(),
                destination: inquiry.destination.clone(),
                departure_at: inquiry.departure_at,
                return_at: inquiry.return_at,
                aircraft: quote.aircraft.clone(),
                operator: quote.operator.clone(),
            },
            created_at: Utc::now(),
        }
    }
}
