use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quote status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
    Booked,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "PENDING",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Rejected => "REJECTED",
            QuoteStatus::Expired => "EXPIRED",
            QuoteStatus::Booked => "BOOKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(QuoteStatus::Pending),
            "ACCEPTED" => Some(QuoteStatus::Accepted),
            "REJECTED" => Some(QuoteStatus::Rejected),
            "EXPIRED" => Some(QuoteStatus::Expired),
            "BOOKED" => Some(QuoteStatus::Booked),
            _ => None,
        }
    }
}

/// An operator's commercial offer against an Inquiry.
///
/// Prices are integer minor units (cents). `total_cents` is what a Booking
/// freezes at acceptance time; later edits to the quote never reach an
/// already-created booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub inquiry_id: Uuid,
    pub aircraft: String,
    pub operator: String,
    pub base_cents: i64,
    pub taxes_cents: i64,
    pub fees_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub valid_until: DateTime<Utc>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Expiry is checked lazily at acceptance time; there is no background
    /// sweep, so a stale read may still show PENDING past `valid_until`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn quote(valid_until: DateTime<Utc>) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            inquiry_id: Uuid::new_v4(),
            aircraft: "Gulfstream G650".to_string(),
            operator: "NorthStar Aviation".to_string(),
            base_cents: 4_500_000,
            taxes_cents: 300_000,
            fees_cents: 200_000,
            total_cents: 5_000_000,
            currency: "USD".to_string(),
            valid_until,
            status: QuoteStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_quote_expiry_is_strict() {
        let now = Utc::now();
        assert!(quote(now - Duration::minutes(1)).is_expired(now));
        assert!(!quote(now + Duration::minutes(1)).is_expired(now));
        // now == valid_until still accepts
        let q = quote(now);
        assert!(!q.is_expired(now));
    }
}
