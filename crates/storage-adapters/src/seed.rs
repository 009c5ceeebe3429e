//! Reference badge definitions.
//!
//! The PostgreSQL migration inserts the same rows with the same ids; keep
//! both in sync when adding a badge.

use domains::{BadgeDefinition, BadgeKind};
use uuid::Uuid;

const DEFAULT_BADGES: [(u128, &str, &str, BadgeKind, i64); 10] = [
    (0x018f_2c00_0000_7000_8000_000000000001, "First Review", "badges/first_review.png", BadgeKind::Reviews, 1),
    (0x018f_2c00_0000_7000_8000_000000000002, "Critic", "badges/critic.png", BadgeKind::Reviews, 10),
    (0x018f_2c00_0000_7000_8000_000000000003, "Explorer", "badges/explorer.png", BadgeKind::Visits, 1),
    (0x018f_2c00_0000_7000_8000_000000000004, "Wanderer", "badges/wanderer.png", BadgeKind::Visits, 10),
    (0x018f_2c00_0000_7000_8000_000000000005, "Spot Creator", "badges/spot_creator.png", BadgeKind::Spots, 1),
    (0x018f_2c00_0000_7000_8000_000000000006, "Cartographer", "badges/cartographer.png", BadgeKind::Spots, 10),
    (0x018f_2c00_0000_7000_8000_000000000007, "Friendly", "badges/friendly.png", BadgeKind::Friends, 1),
    (0x018f_2c00_0000_7000_8000_000000000008, "Social Butterfly", "badges/social_butterfly.png", BadgeKind::Friends, 10),
    (0x018f_2c00_0000_7000_8000_000000000009, "First Like", "badges/first_like.png", BadgeKind::Likes, 1),
    (0x018f_2c00_0000_7000_8000_00000000000a, "Enthusiast", "badges/enthusiast.png", BadgeKind::Likes, 25),
];

pub fn default_badge_definitions() -> Vec<BadgeDefinition> {
    DEFAULT_BADGES
        .iter()
        .map(|&(id, name, image_path, kind, threshold)| BadgeDefinition {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            image_path: image_path.to_string(),
            kind,
            threshold,
        })
        .collect()
}
