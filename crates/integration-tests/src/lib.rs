//! Shared fixtures for the cross-crate tests: an in-memory store, a clock
//! the test controls, and the four services wired onto them.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{Clock, Spot, User};
use services::{BadgeEngine, FriendService, ProximityService, VisitService};
use storage_adapters::MemoryStore;
use uuid::Uuid;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct World {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub friends: FriendService,
    pub badges: BadgeEngine,
    pub proximity: ProximityService,
    pub visits: VisitService,
}

impl World {
    /// Fresh store with the default badge catalogue, clock at 2024-06-01 09:00 UTC.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::with_default_badges());
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()));

        Self {
            friends: FriendService::new(store.clone(), store.clone(), clock.clone()),
            badges: BadgeEngine::new(store.clone(), store.clone(), clock.clone()),
            proximity: ProximityService::new(store.clone()),
            visits: VisitService::new(store.clone(), store.clone(), clock.clone()),
            store,
            clock,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: format!("{username}@chillspot.test"),
            profile_pic: None,
            xp: 0,
            created_at: self.clock.now(),
        };
        self.store.insert_user(user.clone()).await.unwrap();
        user
    }

    pub async fn spot(&self, owner: Uuid, title: &str, latitude: f64, longitude: f64) -> Spot {
        let now = self.clock.now();
        let spot = Spot {
            id: Uuid::now_v7(),
            user_id: owner,
            title: title.to_string(),
            description: String::new(),
            latitude,
            longitude,
            altitude: None,
            recommended_weather: None,
            visit_count: 0,
            favorites_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_spot(spot.clone()).await.unwrap();
        spot
    }

    /// Sends a request from `a` to `b` and accepts it.
    pub async fn befriend(&self, a: &User, b: &User) {
        let request = self.friends.send_request(a.id, b.id).await.unwrap();
        self.friends.accept(b.id, request.id).await.unwrap();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Degrees of latitude spanning `meters` along a meridian.
pub fn meters_north(meters: f64) -> f64 {
    (meters / services::proximity::EARTH_RADIUS_METERS).to_degrees()
}
