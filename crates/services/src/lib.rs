//! # services
//!
//! The Chillspot engine: friend requests, badges, proximity and the
//! visit/review guard. Every operation takes the caller's identity as an
//! explicit argument and talks to storage only through the `domains` ports.

pub mod badges;
pub mod friends;
pub mod proximity;
pub mod visits;

pub use badges::{BadgeEngine, BadgeEvaluation};
pub use friends::FriendService;
pub use proximity::{calculate_distance, ProximityService, PROXIMITY_THRESHOLD_METERS};
pub use visits::VisitService;
