//! # Achievement Counter & Badge Engine
//!
//! Compares a user's activity counters with every badge definition and
//! awards the missing ones. Each definition is checked and awarded on its
//! own; there is no transaction spanning definitions. Duplicate awards from
//! concurrent evaluations are absorbed by the storage-level unique key on
//! (user, definition).

use std::collections::HashSet;
use std::sync::Arc;

use domains::{AppError, Badge, BadgeRepository, Clock, Result, UserRepository};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeEvaluation {
    /// Badges awarded by this call
    pub new_badges: Vec<Badge>,
    /// Everything the user holds after this call
    pub all_badges: Vec<Badge>,
}

pub struct BadgeEngine {
    users: Arc<dyn UserRepository>,
    badges: Arc<dyn BadgeRepository>,
    clock: Arc<dyn Clock>,
}

impl BadgeEngine {
    pub fn new(
        users: Arc<dyn UserRepository>,
        badges: Arc<dyn BadgeRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, badges, clock }
    }

    /// Awards every badge `user_id` qualifies for but does not hold yet.
    ///
    /// Running this twice without new activity awards nothing the second time.
    #[instrument(skip(self))]
    pub async fn evaluate_and_award(&self, user_id: Uuid) -> Result<BadgeEvaluation> {
        if self.users.find_user(user_id).await?.is_none() {
            return Err(AppError::not_found("user", user_id));
        }

        let counts = self.badges.activity_counts(user_id).await?;
        let definitions = self.badges.list_definitions().await?;
        let held: HashSet<Uuid> = self
            .badges
            .list_badges(user_id)
            .await?
            .into_iter()
            .map(|badge| badge.definition_id)
            .collect();

        let mut new_badges = Vec::new();
        for definition in &definitions {
            if held.contains(&definition.id) || counts.count_for(definition.kind) < definition.threshold {
                continue;
            }

            let badge = Badge::award(user_id, definition, self.clock.now());
            if self.badges.insert_badge(&badge).await? {
                info!(badge = %badge.name, definition_id = %definition.id, "badge awarded");
                new_badges.push(badge);
            } else {
                debug!(definition_id = %definition.id, "badge already awarded by a concurrent evaluation");
            }
        }

        let all_badges = self.badges.list_badges(user_id).await?;
        Ok(BadgeEvaluation { new_badges, all_badges })
    }

    /// Badges held by `user_id`, oldest first.
    pub async fn list_badges(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        self.badges.list_badges(user_id).await
    }
}
