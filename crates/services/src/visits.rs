//! # Visit/Review Dedup Guard
//!
//! Two visit policies live side by side:
//! - explicit registration ("mark as visited") is allowed once ever per (user, spot);
//! - passive tracking records at most one row per (user, spot) per UTC calendar day
//!   and is a silent no-op after the first call of the day.
//!
//! Reviews need a prior visit and are limited to one per (user, spot).
//! The lookups here only short-circuit; the storage adapters hold the
//! unique constraints that actually guarantee these rules.

use std::sync::Arc;

use domains::{
    AppError, Clock, Like, Result, Review, ReviewRepository, Spot, SpotRepository, VisitSource,
    VisitedSpot, MAX_REVIEW_LEN,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub struct VisitService {
    spots: Arc<dyn SpotRepository>,
    reviews: Arc<dyn ReviewRepository>,
    clock: Arc<dyn Clock>,
}

impl VisitService {
    pub fn new(
        spots: Arc<dyn SpotRepository>,
        reviews: Arc<dyn ReviewRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { spots, reviews, clock }
    }

    /// Marks one of the caller's own spots as visited. Once ever.
    #[instrument(skip(self, notes))]
    pub async fn add_visited_spot(&self, user_id: Uuid, spot_id: Uuid, notes: String) -> Result<VisitedSpot> {
        match self.spots.find_spot(spot_id).await? {
            Some(spot) if spot.user_id == user_id => {}
            _ => return Err(AppError::not_found("spot", spot_id)),
        }

        if self.spots.has_visited(user_id, spot_id).await? {
            return Err(AppError::Conflict("spot already marked as visited".into()));
        }

        let visit = VisitedSpot::new(user_id, spot_id, self.clock.now(), notes, VisitSource::Explicit);
        self.spots.insert_visit(&visit).await?;

        info!(visit_id = %visit.id, "visit registered");
        Ok(visit)
    }

    /// Records a passive visit. Returns `false` when the user was already
    /// tracked at this spot today; that is still a success.
    #[instrument(skip(self))]
    pub async fn track_visit(&self, user_id: Uuid, spot_id: Uuid) -> Result<bool> {
        if self.spots.find_spot(spot_id).await?.is_none() {
            return Err(AppError::not_found("spot", spot_id));
        }

        let visit = VisitedSpot::new(user_id, spot_id, self.clock.now(), String::new(), VisitSource::Tracked);
        let recorded = self.spots.record_tracked_visit(&visit).await?;

        if recorded {
            info!(visit_id = %visit.id, day = %visit.visit_day(), "visit tracked");
        } else {
            debug!(day = %visit.visit_day(), "visit already tracked today");
        }
        Ok(recorded)
    }

    #[instrument(skip(self, text))]
    pub async fn create_review(&self, user_id: Uuid, spot_id: Uuid, text: String) -> Result<Review> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::InvalidArgument("review text is required".into()));
        }
        if text.chars().count() > MAX_REVIEW_LEN {
            return Err(AppError::InvalidArgument(format!(
                "review text is limited to {MAX_REVIEW_LEN} characters"
            )));
        }

        if !self.spots.has_visited(user_id, spot_id).await? {
            return Err(AppError::Forbidden("you must visit a spot before reviewing it".into()));
        }
        if self.reviews.find_review(user_id, spot_id).await?.is_some() {
            return Err(AppError::Conflict("you've already reviewed this spot".into()));
        }

        let review = Review {
            id: Uuid::now_v7(),
            user_id,
            spot_id,
            text,
            likes: 0,
            created_at: self.clock.now(),
        };
        self.reviews.insert_review(&review).await?;

        info!(review_id = %review.id, "review created");
        Ok(review)
    }

    /// Likes a spot once; returns the spot with its bumped favorites counter.
    #[instrument(skip(self))]
    pub async fn like_spot(&self, user_id: Uuid, spot_id: Uuid) -> Result<Spot> {
        if self.spots.find_spot(spot_id).await?.is_none() {
            return Err(AppError::not_found("spot", spot_id));
        }

        let like = Like {
            id: Uuid::now_v7(),
            user_id,
            spot_id,
            created_at: self.clock.now(),
        };
        self.spots.insert_like(&like).await
    }

    /// Visit rows of `user_id`, newest first.
    pub async fn list_visited(&self, user_id: Uuid) -> Result<Vec<VisitedSpot>> {
        self.spots.list_visits(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domains::{MockClock, MockReviewRepository, MockSpotRepository};
    use tokio_test::{assert_err, assert_ok};

    fn spot(id: Uuid, owner: Uuid) -> Spot {
        Spot {
            id,
            user_id: owner,
            title: "Hill".into(),
            description: String::new(),
            latitude: 42.0,
            longitude: 21.0,
            altitude: Some(540.0),
            recommended_weather: None,
            visit_count: 0,
            favorites_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(spots: MockSpotRepository, reviews: MockReviewRepository) -> VisitService {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .return_const(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        VisitService::new(Arc::new(spots), Arc::new(reviews), Arc::new(clock))
    }

    #[tokio::test]
    async fn visiting_someone_elses_spot_is_not_found() {
        let (me, owner, spot_id) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let mut spots = MockSpotRepository::new();
        spots.expect_find_spot().returning(move |id| Ok(Some(spot(id, owner))));
        spots.expect_insert_visit().never();

        let err = assert_err!(service(spots, MockReviewRepository::new()).add_visited_spot(me, spot_id, String::new()).await);
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn second_explicit_visit_conflicts() {
        let (me, spot_id) = (Uuid::now_v7(), Uuid::now_v7());
        let mut spots = MockSpotRepository::new();
        spots.expect_find_spot().returning(move |id| Ok(Some(spot(id, me))));
        spots.expect_has_visited().returning(|_, _| Ok(true));
        spots.expect_insert_visit().never();

        let err = assert_err!(service(spots, MockReviewRepository::new()).add_visited_spot(me, spot_id, "again".into()).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn explicit_visit_is_stored_with_notes() {
        let (me, spot_id) = (Uuid::now_v7(), Uuid::now_v7());
        let mut spots = MockSpotRepository::new();
        spots.expect_find_spot().returning(move |id| Ok(Some(spot(id, me))));
        spots.expect_has_visited().returning(|_, _| Ok(false));
        spots
            .expect_insert_visit()
            .times(1)
            .withf(|v| v.source == VisitSource::Explicit && v.notes == "sunset")
            .returning(|_| Ok(()));

        let visit = assert_ok!(service(spots, MockReviewRepository::new()).add_visited_spot(me, spot_id, "sunset".into()).await);
        assert_eq!(visit.spot_id, spot_id);
    }

    #[tokio::test]
    async fn tracking_an_unknown_spot_is_not_found() {
        let mut spots = MockSpotRepository::new();
        spots.expect_find_spot().returning(|_| Ok(None));
        spots.expect_record_tracked_visit().never();

        let err = assert_err!(service(spots, MockReviewRepository::new()).track_visit(Uuid::now_v7(), Uuid::now_v7()).await);
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn tracked_visit_carries_the_clock_day() {
        let mut spots = MockSpotRepository::new();
        spots.expect_find_spot().returning(|id| Ok(Some(spot(id, Uuid::now_v7()))));
        spots
            .expect_record_tracked_visit()
            .withf(|v| v.source == VisitSource::Tracked && v.visit_day().to_string() == "2024-06-01")
            .returning(|_| Ok(false));

        let recorded = assert_ok!(service(spots, MockReviewRepository::new()).track_visit(Uuid::now_v7(), Uuid::now_v7()).await);
        assert!(!recorded);
    }

    #[tokio::test]
    async fn review_without_visit_is_forbidden() {
        let mut spots = MockSpotRepository::new();
        spots.expect_has_visited().returning(|_, _| Ok(false));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_insert_review().never();

        let err = assert_err!(service(spots, reviews).create_review(Uuid::now_v7(), Uuid::now_v7(), "nice".into()).await);
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn review_text_is_validated_before_lookups() {
        let svc = service(MockSpotRepository::new(), MockReviewRepository::new());
        let (me, spot_id) = (Uuid::now_v7(), Uuid::now_v7());

        let err = assert_err!(svc.create_review(me, spot_id, "   ".into()).await);
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err = assert_err!(svc.create_review(me, spot_id, "x".repeat(MAX_REVIEW_LEN + 1)).await);
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn second_review_conflicts() {
        let (me, spot_id) = (Uuid::now_v7(), Uuid::now_v7());
        let mut spots = MockSpotRepository::new();
        spots.expect_has_visited().returning(|_, _| Ok(true));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_find_review().returning(move |user_id, spot_id| {
            Ok(Some(Review {
                id: Uuid::now_v7(),
                user_id,
                spot_id,
                text: "first".into(),
                likes: 0,
                created_at: Utc::now(),
            }))
        });
        reviews.expect_insert_review().never();

        let err = assert_err!(service(spots, reviews).create_review(me, spot_id, "second".into()).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn review_at_the_length_limit_is_accepted() {
        let mut spots = MockSpotRepository::new();
        spots.expect_has_visited().returning(|_, _| Ok(true));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_find_review().returning(|_, _| Ok(None));
        reviews.expect_insert_review().times(1).returning(|_| Ok(()));

        let text = "é".repeat(MAX_REVIEW_LEN);
        let review = assert_ok!(service(spots, reviews).create_review(Uuid::now_v7(), Uuid::now_v7(), text).await);
        assert_eq!(review.text.chars().count(), MAX_REVIEW_LEN);
        assert_eq!(review.likes, 0);
    }
}
