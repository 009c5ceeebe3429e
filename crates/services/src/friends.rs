//! # Friend Request State Machine
//!
//! `pending -> accepted` or `pending -> declined`; both targets are terminal.
//! Acceptance materializes the friendship edge in both directions inside the
//! same storage transaction as the status change (see
//! [`FriendshipRepository::resolve_request`]).

use std::sync::Arc;

use domains::{
    AppError, Clock, Friend, FriendRequest, FriendshipRepository, PendingRequest, PublicProfile,
    RequestStatus, Result, User, UserRepository,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 50;

pub struct FriendService {
    users: Arc<dyn UserRepository>,
    friendships: Arc<dyn FriendshipRepository>,
    clock: Arc<dyn Clock>,
}

impl FriendService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        friendships: Arc<dyn FriendshipRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, friendships, clock }
    }

    /// Opens a pending request from `sender_id` to `receiver_id`.
    #[instrument(skip(self))]
    pub async fn send_request(&self, sender_id: Uuid, receiver_id: Uuid) -> Result<FriendRequest> {
        if sender_id == receiver_id {
            return Err(AppError::InvalidArgument(
                "cannot send a friend request to yourself".into(),
            ));
        }
        self.require_user(sender_id).await?;
        self.require_user(receiver_id).await?;

        // Pending first: an accept that lands between the two lookups still
        // shows up as a friendship. The insert re-checks both under storage locks.
        if self.friendships.find_pending_between(sender_id, receiver_id).await?.is_some() {
            return Err(AppError::Conflict("friend request already exists".into()));
        }
        if self.friendships.are_friends(sender_id, receiver_id).await? {
            return Err(AppError::Conflict("already friends".into()));
        }

        let request = FriendRequest::pending(sender_id, receiver_id, self.clock.now());
        self.friendships.insert_request(&request).await?;

        info!(request_id = %request.id, "friend request sent");
        Ok(request)
    }

    #[instrument(skip(self))]
    pub async fn accept(&self, current_user_id: Uuid, request_id: Uuid) -> Result<FriendRequest> {
        self.resolve(current_user_id, request_id, RequestStatus::Accepted).await
    }

    #[instrument(skip(self))]
    pub async fn decline(&self, current_user_id: Uuid, request_id: Uuid) -> Result<FriendRequest> {
        self.resolve(current_user_id, request_id, RequestStatus::Declined).await
    }

    async fn resolve(
        &self,
        current_user_id: Uuid,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<FriendRequest> {
        self.require_user(current_user_id).await?;

        let resolved = self
            .friendships
            .resolve_request(request_id, current_user_id, status, self.clock.now())
            .await?;

        match resolved {
            Some(request) => {
                info!(request_id = %request.id, sender_id = %request.sender_id, status = %status, "friend request resolved");
                Ok(request)
            }
            None => Err(self.unresolvable(current_user_id, request_id).await?),
        }
    }

    /// Picks the error for a request that could not be moved out of `pending`.
    async fn unresolvable(&self, current_user_id: Uuid, request_id: Uuid) -> Result<AppError> {
        let error = match self.friendships.find_request(request_id).await? {
            Some(request) if request.receiver_id != current_user_id => AppError::Unauthorized(
                "only the receiver can answer a friend request".into(),
            ),
            _ => AppError::not_found("pending friend request", request_id),
        };
        Ok(error)
    }

    /// Pending requests addressed to `user_id`, newest first.
    pub async fn list_pending(&self, user_id: Uuid) -> Result<Vec<PendingRequest>> {
        self.require_user(user_id).await?;
        self.friendships.list_pending(user_id).await
    }

    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<Friend>> {
        self.require_user(user_id).await?;
        let mut friends = self.friendships.list_friends(user_id).await?;
        friends.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(friends)
    }

    /// Users matching `query` that `user_id` could still send a request to.
    ///
    /// The raw search result is filtered afterwards: existing friends and
    /// anyone sharing a pending request with the caller are dropped, so the
    /// result may be shorter than `limit`.
    #[instrument(skip(self))]
    pub async fn search_candidates(
        &self,
        user_id: Uuid,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PublicProfile>> {
        self.require_user(user_id).await?;

        let limit = match limit {
            0 => DEFAULT_SEARCH_LIMIT,
            n => n.min(MAX_SEARCH_LIMIT),
        };
        let matches = self.users.search_users(user_id, query.trim(), limit).await?;
        let connected = self.friendships.connected_user_ids(user_id).await?;

        let candidates: Vec<PublicProfile> = matches
            .iter()
            .filter(|user| user.id != user_id && !connected.contains(&user.id))
            .map(User::public_profile)
            .collect();

        debug!(raw = matches.len(), kept = candidates.len(), "search candidates filtered");
        Ok(candidates)
    }

    async fn require_user(&self, id: Uuid) -> Result<User> {
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))
    }
}
