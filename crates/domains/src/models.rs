//! # Domain Models
//!
//! Plain data entities for Chillspot. None of these types perform I/O;
//! persistence lives behind the ports in [`crate::ports`].
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Maximum review length, in characters.
pub const MAX_REVIEW_LEN: usize = 500;

/// A registered account. Registration itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Avatar reference handled by the media service
    pub profile_pic: Option<String>,
    pub xp: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            username: self.username.clone(),
            profile_pic: self.profile_pic.clone(),
        }
    }
}

/// What other users are allowed to see about an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub profile_pic: Option<String>,
}

/// The other end of a friendship edge, as shown in a friends list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub id: Uuid,
    pub username: String,
    pub profile_pic: Option<String>,
    pub xp: i64,
}

/// Lifecycle of a friend request. `Accepted` and `Declined` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "declined" => Ok(RequestStatus::Declined),
            other => Err(AppError::Internal(format!("unknown request status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    /// A fresh request in the `pending` state.
    pub fn pending(sender_id: Uuid, receiver_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender_id,
            receiver_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the request connects `a` and `b`, in either direction.
    pub fn connects(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b) || (self.sender_id == b && self.receiver_id == a)
    }
}

/// A pending request as shown to its receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: Uuid,
    pub sender: PublicProfile,
    pub created_at: DateTime<Utc>,
}

/// The activity metric a badge definition counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    Reviews,
    Visits,
    Spots,
    Friends,
    Likes,
}

impl BadgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeKind::Reviews => "reviews",
            BadgeKind::Visits => "visits",
            BadgeKind::Spots => "spots",
            BadgeKind::Friends => "friends",
            BadgeKind::Likes => "likes",
        }
    }
}

impl FromStr for BadgeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reviews" => Ok(BadgeKind::Reviews),
            "visits" => Ok(BadgeKind::Visits),
            "spots" => Ok(BadgeKind::Spots),
            "friends" => Ok(BadgeKind::Friends),
            "likes" => Ok(BadgeKind::Likes),
            other => Err(AppError::Internal(format!("unknown badge kind '{other}'"))),
        }
    }
}

/// Reference data: a named achievement and the threshold that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: Uuid,
    pub name: String,
    pub image_path: String,
    pub kind: BadgeKind,
    pub threshold: i64,
}

/// An awarded badge. At most one per (user, definition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub definition_id: Uuid,
    pub name: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

impl Badge {
    pub fn award(user_id: Uuid, definition: &BadgeDefinition, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            definition_id: definition.id,
            name: definition.name.clone(),
            image_path: definition.image_path.clone(),
            created_at: now,
        }
    }
}

/// Per-user activity totals the badge engine compares against thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub reviews: i64,
    /// Distinct spots, not visit rows
    pub visits: i64,
    pub spots: i64,
    pub friends: i64,
    pub likes: i64,
}

impl ActivityCounts {
    pub fn count_for(&self, kind: BadgeKind) -> i64 {
        match kind {
            BadgeKind::Reviews => self.reviews,
            BadgeKind::Visits => self.visits,
            BadgeKind::Spots => self.spots,
            BadgeKind::Friends => self.friends,
            BadgeKind::Likes => self.likes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Rainy,
    Cloudy,
    Snowy,
}

impl Weather {
    pub fn as_str(self) -> &'static str {
        match self {
            Weather::Sunny => "sunny",
            Weather::Rainy => "rainy",
            Weather::Cloudy => "cloudy",
            Weather::Snowy => "snowy",
        }
    }
}

impl FromStr for Weather {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunny" => Ok(Weather::Sunny),
            "rainy" => Ok(Weather::Rainy),
            "cloudy" => Ok(Weather::Cloudy),
            "snowy" => Ok(Weather::Snowy),
            other => Err(AppError::InvalidArgument(format!("unknown weather '{other}'"))),
        }
    }
}

/// A point of interest owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub recommended_weather: Option<Weather>,
    pub visit_count: i64,
    pub favorites_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a visit row came to exist. The two sources follow different dedup rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitSource {
    /// "Mark as visited": once ever per (user, spot)
    Explicit,
    /// Passive tracking: once per calendar day per (user, spot)
    Tracked,
}

impl VisitSource {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitSource::Explicit => "explicit",
            VisitSource::Tracked => "tracked",
        }
    }
}

impl FromStr for VisitSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit" => Ok(VisitSource::Explicit),
            "tracked" => Ok(VisitSource::Tracked),
            other => Err(AppError::Internal(format!("unknown visit source '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitedSpot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Uuid,
    pub visited_at: DateTime<Utc>,
    pub notes: String,
    pub source: VisitSource,
}

impl VisitedSpot {
    pub fn new(
        user_id: Uuid,
        spot_id: Uuid,
        visited_at: DateTime<Utc>,
        notes: String,
        source: VisitSource,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            spot_id,
            visited_at,
            notes,
            source,
        }
    }

    /// The UTC calendar day used for once-per-day deduplication.
    pub fn visit_day(&self) -> NaiveDate {
        self.visited_at.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Uuid,
    pub text: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An unvisited owned spot within proximity range of the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbySpot {
    pub spot_id: Uuid,
    pub title: String,
    /// Great-circle distance in meters
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
}
