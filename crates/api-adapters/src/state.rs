use std::sync::Arc;

use domains::{
    BadgeRepository, Clock, FriendshipRepository, IdentityResolver, ReviewRepository,
    SpotRepository, UserRepository,
};
use services::{BadgeEngine, FriendService, ProximityService, VisitService};

use crate::metrics::Metrics;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub friends: Arc<FriendService>,
    pub badges: Arc<BadgeEngine>,
    pub proximity: Arc<ProximityService>,
    pub visits: Arc<VisitService>,
    pub identity: Arc<dyn IdentityResolver>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wires all services onto one store that implements every repository port.
    pub fn from_store<S>(store: Arc<S>, identity: Arc<dyn IdentityResolver>, clock: Arc<dyn Clock>) -> Self
    where
        S: UserRepository + FriendshipRepository + BadgeRepository + SpotRepository + ReviewRepository + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let friendships: Arc<dyn FriendshipRepository> = store.clone();
        let badges: Arc<dyn BadgeRepository> = store.clone();
        let spots: Arc<dyn SpotRepository> = store.clone();
        let reviews: Arc<dyn ReviewRepository> = store;

        Self {
            friends: Arc::new(FriendService::new(users.clone(), friendships, clock.clone())),
            badges: Arc::new(BadgeEngine::new(users, badges, clock.clone())),
            proximity: Arc::new(ProximityService::new(spots.clone())),
            visits: Arc::new(VisitService::new(spots, reviews, clock)),
            identity,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
