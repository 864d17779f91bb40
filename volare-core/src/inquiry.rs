use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteType {
    OneWay,
    RoundTrip,
    MultiCity,
}

/// Inquiry status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryStatus {
    New,
    InProgress,
    Quoted,
    Booked,
    Closed,
}

impl InquiryStatus {
    /// Position along the forward-only progression. Closed sits outside it.
    fn rank(self) -> Option<u8> {
        match self {
            InquiryStatus::New => Some(0),
            InquiryStatus::InProgress => Some(1),
            InquiryStatus::Quoted => Some(2),
            InquiryStatus::Booked => Some(3),
            InquiryStatus::Closed => None,
        }
    }

    /// Status only advances New -> InProgress -> Quoted -> Booked (skips
    /// allowed), or to Closed from any non-Booked state. Never regresses.
    pub fn can_advance_to(self, next: InquiryStatus) -> bool {
        match (self.rank(), next) {
            (Some(cur), InquiryStatus::Closed) => cur < 3,
            (Some(cur), _) => match next.rank() {
                Some(n) => n > cur,
                None => false,
            },
            (None, _) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "NEW",
            InquiryStatus::InProgress => "IN_PROGRESS",
            InquiryStatus::Quoted => "QUOTED",
            InquiryStatus::Booked => "BOOKED",
            InquiryStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(InquiryStatus::New),
            "IN_PROGRESS" => Some(InquiryStatus::InProgress),
            "QUOTED" => Some(InquiryStatus::Quoted),
            "BOOKED" => Some(InquiryStatus::Booked),
            "CLOSED" => Some(InquiryStatus::Closed),
            _ => None,
        }
    }
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::OneWay => "ONE_WAY",
            RouteType::RoundTrip => "ROUND_TRIP",
            RouteType::MultiCity => "MULTI_CITY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONE_WAY" => Some(RouteType::OneWay),
            "ROUND_TRIP" => Some(RouteType::RoundTrip),
            "MULTI_CITY" => Some(RouteType::MultiCity),
            _ => None,
        }
    }
}

/// A customer's unconfirmed travel request. Never deleted, only closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub customer_id: String,
    pub route_type: RouteType,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub return_at: Option<DateTime<Utc>>,
    pub passengers: u32,
    pub purpose: String,
    pub notes: Option<String>,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new inquiry, validated before an
/// `Inquiry` is ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryDraft {
    pub route_type: RouteType,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub return_at: Option<DateTime<Utc>>,
    pub passengers: u32,
    pub purpose: String,
    pub notes: Option<String>,
}

impl Inquiry {
    pub fn new(customer_id: String, draft: InquiryDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            route_type: draft.route_type,
            origin: draft.origin,
            destination: draft.destination,
            departure_at: draft.departure_at,
            return_at: draft.return_at,
            passengers: draft.passengers,
            purpose: draft.purpose,
            notes: draft.notes,
            status: InquiryStatus::New,
            created_at: Utc::now(),
        }
    }
}
