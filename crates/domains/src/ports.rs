//! # Ports
//!
//! Every storage or identity adapter implements these traits. Services only
//! ever see `Arc<dyn Port>`, so the binary decides which adapter backs them.
//!
//! Uniqueness rules are part of the contract: an adapter must enforce them
//! itself (unique index, single write lock, ...) and must not rely on the
//! caller having checked first.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ActivityCounts, Badge, BadgeDefinition, Friend, FriendRequest, Like, PendingRequest,
    RequestStatus, Review, Spot, User, VisitedSpot,
};

/// Read access to accounts. Accounts are created by the registration service.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Case-insensitive substring match on username or email, never returning `exclude`.
    async fn search_users(&self, exclude: Uuid, query: &str, limit: u32) -> Result<Vec<User>>;
}

/// Friend requests and the symmetric friendship edge table.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    async fn find_request(&self, id: Uuid) -> Result<Option<FriendRequest>>;

    /// The pending request between `a` and `b`, in either direction.
    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>>;

    async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool>;

    /// Stores a new pending request.
    ///
    /// Fails with `Conflict` if the two users are already friends or a
    /// pending request already exists for the unordered pair. Must not race
    /// with [`resolve_request`](Self::resolve_request) for the same pair.
    async fn insert_request(&self, request: &FriendRequest) -> Result<()>;

    /// Moves a pending request addressed to `receiver_id` into `status`.
    ///
    /// When `status` is `Accepted`, both friendship edges are inserted in the
    /// same transaction as the status change. Returns `None` when no pending
    /// request with that id is addressed to `receiver_id`; nothing is written
    /// in that case.
    async fn resolve_request(
        &self,
        request_id: Uuid,
        receiver_id: Uuid,
        status: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<FriendRequest>>;

    /// Pending requests addressed to `receiver_id`, newest first.
    async fn list_pending(&self, receiver_id: Uuid) -> Result<Vec<PendingRequest>>;

    async fn list_friends(&self, user_id: Uuid) -> Result<Vec<Friend>>;

    /// Users that are friends with `user_id` or share a pending request with it.
    async fn connected_user_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;
}

/// Badge definitions, award records and the activity counters behind them.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    async fn list_definitions(&self) -> Result<Vec<BadgeDefinition>>;

    async fn activity_counts(&self, user_id: Uuid) -> Result<ActivityCounts>;

    /// Badges held by `user_id`, oldest first.
    async fn list_badges(&self, user_id: Uuid) -> Result<Vec<Badge>>;

    /// Inserts an award. Returns `false` when the user already holds a badge
    /// for the same definition; that is not an error.
    async fn insert_badge(&self, badge: &Badge) -> Result<bool>;
}

/// Spots, visits and likes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn find_spot(&self, id: Uuid) -> Result<Option<Spot>>;

    async fn list_spots_by_owner(&self, user_id: Uuid) -> Result<Vec<Spot>>;

    /// Visit rows of `user_id`, newest first.
    async fn list_visits(&self, user_id: Uuid) -> Result<Vec<VisitedSpot>>;

    async fn has_visited(&self, user_id: Uuid, spot_id: Uuid) -> Result<bool>;

    /// Stores an explicit visit. `Conflict` if any visit exists for (user, spot).
    async fn insert_visit(&self, visit: &VisitedSpot) -> Result<()>;

    /// Stores a tracked visit unless one exists for (user, spot) on the same
    /// calendar day, bumping the spot's visit counter in the same transaction.
    /// Returns `false` for the no-op case.
    async fn record_tracked_visit(&self, visit: &VisitedSpot) -> Result<bool>;

    /// Stores a like and bumps the spot's favorites counter atomically.
    /// `Conflict` if the user already liked the spot.
    async fn insert_like(&self, like: &Like) -> Result<Spot>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_review(&self, user_id: Uuid, spot_id: Uuid) -> Result<Option<Review>>;

    /// `Conflict` if the user already reviewed the spot.
    async fn insert_review(&self, review: &Review) -> Result<()>;
}

/// Turns a bearer credential issued by the external auth service into a user id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Uuid>;
}

/// Source of "now". Calendar-day dedup depends on it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
