//! # domains
//!
//! Entities, error taxonomy and port traits for the Chillspot social graph
//! and achievement engine. This crate performs no I/O.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn pending_request_connects_both_directions() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let request = FriendRequest::pending(a, b, Utc::now());

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(!request.status.is_terminal());
        assert!(request.connects(a, b));
        assert!(request.connects(b, a));
        assert!(!request.connects(a, c));
    }

    #[test]
    fn request_status_round_trips_through_str() {
        for status in [RequestStatus::Pending, RequestStatus::Accepted, RequestStatus::Declined] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<RequestStatus>().is_err());
        assert!(RequestStatus::Declined.is_terminal());
    }

    #[test]
    fn counts_are_selected_by_kind() {
        let counts = ActivityCounts { reviews: 1, visits: 2, spots: 3, friends: 4, likes: 5 };
        assert_eq!(counts.count_for(BadgeKind::Reviews), 1);
        assert_eq!(counts.count_for(BadgeKind::Visits), 2);
        assert_eq!(counts.count_for(BadgeKind::Spots), 3);
        assert_eq!(counts.count_for(BadgeKind::Friends), 4);
        assert_eq!(counts.count_for(BadgeKind::Likes), 5);
    }

    #[test]
    fn badge_award_copies_definition_display_fields() {
        let definition = BadgeDefinition {
            id: Uuid::now_v7(),
            name: "Explorer".into(),
            image_path: "badges/explorer.png".into(),
            kind: BadgeKind::Visits,
            threshold: 10,
        };
        let user = Uuid::now_v7();
        let badge = Badge::award(user, &definition, Utc::now());

        assert_eq!(badge.user_id, user);
        assert_eq!(badge.definition_id, definition.id);
        assert_eq!(badge.name, "Explorer");
        assert_eq!(badge.image_path, "badges/explorer.png");
    }

    #[test]
    fn visit_day_is_the_utc_calendar_date() {
        let late = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap();
        let visit = VisitedSpot::new(Uuid::now_v7(), Uuid::now_v7(), late, String::new(), VisitSource::Tracked);
        assert_eq!(visit.visit_day().to_string(), "2024-05-01");
    }

    #[test]
    fn nearby_spot_serializes_camel_case() {
        let spot = NearbySpot {
            spot_id: Uuid::nil(),
            title: "Lake".into(),
            distance: 12.5,
            latitude: 42.0,
            longitude: 21.0,
        };
        let json = serde_json::to_value(&spot).unwrap();
        assert!(json.get("spotId").is_some());
        assert_eq!(json["distance"], 12.5);
    }
}
