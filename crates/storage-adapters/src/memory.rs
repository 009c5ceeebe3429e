//! # In-memory store
//!
//! Implements every repository port over plain collections behind a single
//! `RwLock`. Each write takes the write lock once, so a check-and-insert is
//! atomic in the same way a unique index makes it atomic in PostgreSQL.
//! Used by the test suites and for running the server without a database.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    ActivityCounts, AppError, Badge, BadgeDefinition, BadgeRepository, Friend, FriendRequest,
    FriendshipRepository, Like, PendingRequest, RequestStatus, Result, Review, ReviewRepository,
    Spot, SpotRepository, User, UserRepository, VisitSource, VisitedSpot,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::seed::default_badge_definitions;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    requests: HashMap<Uuid, FriendRequest>,
    /// Directed edges; always written in pairs.
    friendships: HashSet<(Uuid, Uuid)>,
    definitions: Vec<BadgeDefinition>,
    badges: Vec<Badge>,
    spots: HashMap<Uuid, Spot>,
    visits: Vec<VisitedSpot>,
    reviews: Vec<Review>,
    likes: Vec<Like>,
}

impl Tables {
    fn pending_between(&self, a: Uuid, b: Uuid) -> Option<&FriendRequest> {
        self.requests
            .values()
            .find(|r| r.status == RequestStatus::Pending && r.connects(a, b))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with the reference badge definitions.
    pub fn with_default_badges() -> Self {
        let tables = Tables {
            definitions: default_badge_definitions(),
            ..Default::default()
        };
        Self { tables: RwLock::new(tables) }
    }

    // Registration and spot creation belong to other services; these
    // helpers stand in for them.

    pub async fn insert_user(&self, user: User) -> Result<()> {
        let (username, email) = (user.username.to_lowercase(), user.email.to_lowercase());
        let mut tables = self.tables.write().await;
        let taken = tables.users.values().any(|u| {
            u.id == user.id || u.username.to_lowercase() == username || u.email.to_lowercase() == email
        });
        if taken {
            return Err(AppError::Conflict("username or email already registered".into()));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    pub async fn insert_spot(&self, spot: Spot) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&spot.user_id) {
            return Err(AppError::not_found("user", spot.user_id));
        }
        tables.spots.insert(spot.id, spot);
        Ok(())
    }

    pub async fn insert_definition(&self, definition: BadgeDefinition) {
        self.tables.write().await.definitions.push(definition);
    }

    pub async fn spot(&self, id: Uuid) -> Option<Spot> {
        self.tables.read().await.spots.get(&id).cloned()
    }

    /// Number of pending requests between `a` and `b`, in either direction.
    pub async fn pending_count(&self, a: Uuid, b: Uuid) -> usize {
        self.tables
            .read()
            .await
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending && r.connects(a, b))
            .count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn search_users(&self, exclude: Uuid, query: &str, limit: u32) -> Result<Vec<User>> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let mut found: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.id != exclude)
            .filter(|u| u.username.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl FriendshipRepository for MemoryStore {
    async fn find_request(&self, id: Uuid) -> Result<Option<FriendRequest>> {
        Ok(self.tables.read().await.requests.get(&id).cloned())
    }

    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>> {
        Ok(self.tables.read().await.pending_between(a, b).cloned())
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool> {
        Ok(self.tables.read().await.friendships.contains(&(a, b)))
    }

    async fn insert_request(&self, request: &FriendRequest) -> Result<()> {
        let mut tables = self.tables.write().await;
        for id in [request.sender_id, request.receiver_id] {
            if !tables.users.contains_key(&id) {
                return Err(AppError::not_found("user", id));
            }
        }
        if tables.friendships.contains(&(request.sender_id, request.receiver_id)) {
            return Err(AppError::Conflict("already friends".into()));
        }
        if tables.pending_between(request.sender_id, request.receiver_id).is_some() {
            return Err(AppError::Conflict("friend request already exists".into()));
        }
        tables.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn resolve_request(
        &self,
        request_id: Uuid,
        receiver_id: Uuid,
        status: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<FriendRequest>> {
        let mut tables = self.tables.write().await;

        let request = match tables.requests.get_mut(&request_id) {
            Some(r) if r.receiver_id == receiver_id && r.status == RequestStatus::Pending => r,
            _ => return Ok(None),
        };
        request.status = status;
        request.updated_at = now;
        let resolved = request.clone();

        if status == RequestStatus::Accepted {
            tables.friendships.insert((resolved.receiver_id, resolved.sender_id));
            tables.friendships.insert((resolved.sender_id, resolved.receiver_id));
        }
        debug!(request_id = %request_id, status = %status, "request resolved in memory");
        Ok(Some(resolved))
    }

    async fn list_pending(&self, receiver_id: Uuid) -> Result<Vec<PendingRequest>> {
        let tables = self.tables.read().await;
        let mut pending: Vec<PendingRequest> = tables
            .requests
            .values()
            .filter(|r| r.receiver_id == receiver_id && r.status == RequestStatus::Pending)
            .filter_map(|r| {
                tables.users.get(&r.sender_id).map(|sender| PendingRequest {
                    id: r.id,
                    sender: sender.public_profile(),
                    created_at: r.created_at,
                })
            })
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(pending)
    }

    async fn list_friends(&self, user_id: Uuid) -> Result<Vec<Friend>> {
        let tables = self.tables.read().await;
        Ok(tables
            .friendships
            .iter()
            .filter(|(from, _)| *from == user_id)
            .filter_map(|(_, to)| tables.users.get(to))
            .map(|u| Friend {
                id: u.id,
                username: u.username.clone(),
                profile_pic: u.profile_pic.clone(),
                xp: u.xp,
            })
            .collect())
    }

    async fn connected_user_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let tables = self.tables.read().await;
        let friends = tables
            .friendships
            .iter()
            .filter(|(from, _)| *from == user_id)
            .map(|(_, to)| *to);
        let pending = tables
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .filter_map(|r| match (r.sender_id == user_id, r.receiver_id == user_id) {
                (true, _) => Some(r.receiver_id),
                (_, true) => Some(r.sender_id),
                _ => None,
            });
        Ok(friends.chain(pending).collect())
    }
}

#[async_trait]
impl BadgeRepository for MemoryStore {
    async fn list_definitions(&self) -> Result<Vec<BadgeDefinition>> {
        Ok(self.tables.read().await.definitions.clone())
    }

    async fn activity_counts(&self, user_id: Uuid) -> Result<ActivityCounts> {
        let tables = self.tables.read().await;
        let visited: HashSet<Uuid> = tables
            .visits
            .iter()
            .filter(|v| v.user_id == user_id)
            .map(|v| v.spot_id)
            .collect();

        Ok(ActivityCounts {
            reviews: tables.reviews.iter().filter(|r| r.user_id == user_id).count() as i64,
            visits: visited.len() as i64,
            spots: tables.spots.values().filter(|s| s.user_id == user_id).count() as i64,
            friends: tables.friendships.iter().filter(|(from, _)| *from == user_id).count() as i64,
            likes: tables.likes.iter().filter(|l| l.user_id == user_id).count() as i64,
        })
    }

    async fn list_badges(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        let tables = self.tables.read().await;
        let mut badges: Vec<Badge> = tables.badges.iter().filter(|b| b.user_id == user_id).cloned().collect();
        badges.sort_by_key(|b| b.created_at);
        Ok(badges)
    }

    async fn insert_badge(&self, badge: &Badge) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let held = tables
            .badges
            .iter()
            .any(|b| b.user_id == badge.user_id && b.definition_id == badge.definition_id);
        if held {
            return Ok(false);
        }
        tables.badges.push(badge.clone());
        Ok(true)
    }
}

#[async_trait]
impl SpotRepository for MemoryStore {
    async fn find_spot(&self, id: Uuid) -> Result<Option<Spot>> {
        Ok(self.tables.read().await.spots.get(&id).cloned())
    }

    async fn list_spots_by_owner(&self, user_id: Uuid) -> Result<Vec<Spot>> {
        let tables = self.tables.read().await;
        Ok(tables.spots.values().filter(|s| s.user_id == user_id).cloned().collect())
    }

    async fn list_visits(&self, user_id: Uuid) -> Result<Vec<VisitedSpot>> {
        let tables = self.tables.read().await;
        let mut visits: Vec<VisitedSpot> = tables.visits.iter().filter(|v| v.user_id == user_id).cloned().collect();
        visits.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        Ok(visits)
    }

    async fn has_visited(&self, user_id: Uuid, spot_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.visits.iter().any(|v| v.user_id == user_id && v.spot_id == spot_id))
    }

    async fn insert_visit(&self, visit: &VisitedSpot) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.spots.contains_key(&visit.spot_id) {
            return Err(AppError::not_found("spot", visit.spot_id));
        }
        let duplicate = tables.visits.iter().any(|v| {
            v.user_id == visit.user_id
                && v.spot_id == visit.spot_id
                && (visit.source == VisitSource::Explicit || v.visit_day() == visit.visit_day())
        });
        if duplicate {
            return Err(AppError::Conflict("spot already marked as visited".into()));
        }
        tables.visits.push(visit.clone());
        Ok(())
    }

    async fn record_tracked_visit(&self, visit: &VisitedSpot) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let day = visit.visit_day();
        let seen_today = tables
            .visits
            .iter()
            .any(|v| v.user_id == visit.user_id && v.spot_id == visit.spot_id && v.visit_day() == day);
        if seen_today {
            return Ok(false);
        }

        let spot = tables
            .spots
            .get_mut(&visit.spot_id)
            .ok_or_else(|| AppError::not_found("spot", visit.spot_id))?;
        spot.visit_count += 1;
        tables.visits.push(visit.clone());
        Ok(true)
    }

    async fn insert_like(&self, like: &Like) -> Result<Spot> {
        let mut tables = self.tables.write().await;
        if tables.likes.iter().any(|l| l.user_id == like.user_id && l.spot_id == like.spot_id) {
            return Err(AppError::Conflict("user already liked this spot".into()));
        }

        let spot = tables
            .spots
            .get_mut(&like.spot_id)
            .ok_or_else(|| AppError::not_found("spot", like.spot_id))?;
        spot.favorites_count += 1;
        spot.updated_at = like.created_at;
        let updated = spot.clone();
        tables.likes.push(like.clone());
        Ok(updated)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn find_review(&self, user_id: Uuid, spot_id: Uuid) -> Result<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.spot_id == spot_id)
            .cloned())
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.reviews.iter().any(|r| r.user_id == review.user_id && r.spot_id == review.spot_id) {
            return Err(AppError::Conflict("you've already reviewed this spot".into()));
        }
        tables.reviews.push(review.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tokio_test::assert_err;

    fn user(name: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: name.into(),
            email: format!("{name}@example.com"),
            profile_pic: None,
            xp: 0,
            created_at: Utc::now(),
        }
    }

    fn spot(owner: Uuid) -> Spot {
        Spot {
            id: Uuid::now_v7(),
            user_id: owner,
            title: "Pier".into(),
            description: String::new(),
            latitude: 41.1,
            longitude: 20.8,
            altitude: None,
            recommended_weather: None,
            visit_count: 0,
            favorites_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn two_users(store: &MemoryStore) -> (User, User) {
        let (a, b) = (user("ana"), user("bojan"));
        store.insert_user(a.clone()).await.unwrap();
        store.insert_user(b.clone()).await.unwrap();
        (a, b)
    }

    #[tokio::test]
    async fn only_one_pending_request_per_unordered_pair() {
        let store = MemoryStore::new();
        let (a, b) = two_users(&store).await;

        store.insert_request(&FriendRequest::pending(a.id, b.id, Utc::now())).await.unwrap();
        let err = assert_err!(store.insert_request(&FriendRequest::pending(b.id, a.id, Utc::now())).await);

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.pending_count(a.id, b.id).await, 1);
    }

    #[tokio::test]
    async fn accepting_writes_both_edges() {
        let store = MemoryStore::new();
        let (a, b) = two_users(&store).await;
        let request = FriendRequest::pending(a.id, b.id, Utc::now());
        store.insert_request(&request).await.unwrap();

        let resolved = store
            .resolve_request(request.id, b.id, RequestStatus::Accepted, Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.status, RequestStatus::Accepted);
        assert!(store.are_friends(a.id, b.id).await.unwrap());
        assert!(store.are_friends(b.id, a.id).await.unwrap());
    }

    #[tokio::test]
    async fn no_new_request_between_friends() {
        let store = MemoryStore::new();
        let (a, b) = two_users(&store).await;
        let request = FriendRequest::pending(a.id, b.id, Utc::now());
        store.insert_request(&request).await.unwrap();
        store.resolve_request(request.id, b.id, RequestStatus::Accepted, Utc::now()).await.unwrap();

        let err = assert_err!(store.insert_request(&FriendRequest::pending(b.id, a.id, Utc::now())).await);
        assert_eq!(err, AppError::Conflict("already friends".into()));
        assert_eq!(store.pending_count(a.id, b.id).await, 0);
    }

    #[tokio::test]
    async fn username_and_email_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        store.insert_user(user("Ana")).await.unwrap();

        let err = assert_err!(store.insert_user(user("ANA")).await);
        assert!(matches!(err, AppError::Conflict(_)));

        let mut other = user("ana2");
        other.email = "ANA@EXAMPLE.COM".into();
        assert!(matches!(store.insert_user(other).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn only_the_receiver_resolves_and_only_once() {
        let store = MemoryStore::new();
        let (a, b) = two_users(&store).await;
        let request = FriendRequest::pending(a.id, b.id, Utc::now());
        store.insert_request(&request).await.unwrap();

        let by_sender = store.resolve_request(request.id, a.id, RequestStatus::Accepted, Utc::now()).await.unwrap();
        assert!(by_sender.is_none());

        store.resolve_request(request.id, b.id, RequestStatus::Declined, Utc::now()).await.unwrap();
        let again = store.resolve_request(request.id, b.id, RequestStatus::Accepted, Utc::now()).await.unwrap();
        assert!(again.is_none());
        assert!(!store.are_friends(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn tracked_visits_dedup_per_day_and_bump_counter_once() {
        let store = MemoryStore::new();
        let (a, _) = two_users(&store).await;
        let pier = spot(a.id);
        store.insert_spot(pier.clone()).await.unwrap();

        let morning = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();
        let evening = morning + Duration::hours(12);
        let next_day = morning + Duration::days(1);

        let track = |at| VisitedSpot::new(a.id, pier.id, at, String::new(), VisitSource::Tracked);
        assert!(store.record_tracked_visit(&track(morning)).await.unwrap());
        assert!(!store.record_tracked_visit(&track(evening)).await.unwrap());
        assert_eq!(store.spot(pier.id).await.unwrap().visit_count, 1);

        assert!(store.record_tracked_visit(&track(next_day)).await.unwrap());
        assert_eq!(store.spot(pier.id).await.unwrap().visit_count, 2);
    }

    #[tokio::test]
    async fn explicit_visit_conflicts_with_any_earlier_visit() {
        let store = MemoryStore::new();
        let (a, _) = two_users(&store).await;
        let pier = spot(a.id);
        store.insert_spot(pier.clone()).await.unwrap();

        let last_week = Utc::now() - Duration::days(7);
        store
            .record_tracked_visit(&VisitedSpot::new(a.id, pier.id, last_week, String::new(), VisitSource::Tracked))
            .await
            .unwrap();

        let explicit = VisitedSpot::new(a.id, pier.id, Utc::now(), "back again".into(), VisitSource::Explicit);
        let err = assert_err!(store.insert_visit(&explicit).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn badge_insert_is_idempotent_per_definition() {
        let store = MemoryStore::with_default_badges();
        let user = Uuid::now_v7();
        let definition = store.list_definitions().await.unwrap().remove(0);

        assert!(store.insert_badge(&Badge::award(user, &definition, Utc::now())).await.unwrap());
        assert!(!store.insert_badge(&Badge::award(user, &definition, Utc::now())).await.unwrap());
        assert_eq!(store.list_badges(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn counts_visits_by_distinct_spot() {
        let store = MemoryStore::new();
        let (a, b) = two_users(&store).await;
        let pier = spot(a.id);
        store.insert_spot(pier.clone()).await.unwrap();

        let day_one = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();
        for at in [day_one, day_one + Duration::days(1)] {
            store
                .record_tracked_visit(&VisitedSpot::new(a.id, pier.id, at, String::new(), VisitSource::Tracked))
                .await
                .unwrap();
        }
        let like = Like { id: Uuid::now_v7(), user_id: a.id, spot_id: pier.id, created_at: Utc::now() };
        store.insert_like(&like).await.unwrap();

        let counts = store.activity_counts(a.id).await.unwrap();
        assert_eq!(counts.visits, 1);
        assert_eq!(counts.spots, 1);
        assert_eq!(counts.likes, 1);
        assert_eq!(store.activity_counts(b.id).await.unwrap(), ActivityCounts::default());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_excludes_caller() {
        let store = MemoryStore::new();
        let (a, b) = two_users(&store).await;

        let found = store.search_users(a.id, "BOJ", 10).await.unwrap();
        assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![b.id]);

        let by_email = store.search_users(a.id, "example.COM", 10).await.unwrap();
        assert_eq!(by_email.len(), 1);
    }
}
