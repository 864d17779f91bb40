use chrono::{DateTime, Utc};
use volare_core::inquiry::{InquiryDraft, RouteType};

pub const MAX_PASSENGERS: u32 = 100;

/// Validate a draft exhaustively, collecting every violated rule rather
/// than stopping at the first, so the caller can present all problems at
/// once.
pub fn validate(draft: &InquiryDraft, now: DateTime<Utc>) -> Vec<String> {
    let mut violations = Vec::new();

    let origin = draft.origin.trim();
    let destination = draft.destination.trim();

    if origin.is_empty() {
        violations.push("origin must not be empty".to_string());
    }
    if destination.is_empty() {
        violations.push("destination must not be empty".to_string());
    }
    if !origin.is_empty() && !destination.is_empty() && origin.eq_ignore_ascii_case(destination) {
        violations.push("origin and destination must be distinct".to_string());
    }

    if draft.departure_at <= now {
        violations.push("departure time must be in the future".to_string());
    }

    if draft.route_type == RouteType::RoundTrip {
        match draft.return_at {
            None => violations.push("return time is required for a round trip".to_string()),
            Some(return_at) if return_at <= draft.departure_at => {
                violations.push("return time must be after departure time".to_string())
            }
            Some(_) => {}
        }
    }

    if draft.passengers < 1 {
        violations.push("at least one passenger is required".to_string());
    } else if draft.passengers > MAX_PASSENGERS {
        violations.push(format!("passenger count may not exceed {}", MAX_PASSENGERS));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn valid_draft(now: DateTime<Utc>) -> InquiryDraft {
        InquiryDraft {
            route_type: RouteType::OneWay,
            origin: "KTEB".to_string(),
            destination: "EGGW".to_string(),
            departure_at: now + Duration::days(7),
            return_at: None,
            passengers: 4,
            purpose: "Business".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        let now = Utc::now();
        assert!(validate(&valid_draft(now), now).is_empty());
    }

    #[test]
    fn test_collects_every_violation() {
        let now = Utc::now();
        let draft = InquiryDraft {
            route_type: RouteType::RoundTrip,
            origin: "  ".to_string(),
            destination: "".to_string(),
            departure_at: now - Duration::hours(1),
            return_at: None,
            passengers: 0,
            purpose: "Leisure".to_string(),
            notes: None,
        };

        let violations = validate(&draft, now);
        // Empty endpoints, past departure, missing return, zero passengers.
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn test_same_endpoints_rejected_case_insensitively() {
        let now = Utc::now();
        let mut draft = valid_draft(now);
        draft.destination = "kteb".to_string();
        let violations = validate(&draft, now);
        assert_eq!(violations, vec!["origin and destination must be distinct"]);
    }

    #[test]
    fn test_round_trip_return_must_follow_departure() {
        let now = Utc::now();
        let mut draft = valid_draft(now);
        draft.route_type = RouteType::RoundTrip;
        draft.return_at = Some(draft.departure_at - Duration::hours(2));
        let violations = validate(&draft, now);
        assert_eq!(violations, vec!["return time must be after departure time"]);
    }

    #[test]
    fn test_passenger_ceiling() {
        let now = Utc::now();
        let mut draft = valid_draft(now);
        draft.passengers = 101;
        assert_eq!(validate(&draft, now).len(), 1);
        draft.passengers = 100;
        assert!(validate(&draft, now).is_empty());
    }
}
