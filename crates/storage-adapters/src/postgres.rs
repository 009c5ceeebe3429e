//! # PostgreSQL store
//!
//! Maps the relational model in `migrations/` to the `domains` models.
//! Every uniqueness rule of the ports is backed by a constraint or unique
//! index, so concurrent callers cannot slip past the pre-checks done in
//! the services.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    ActivityCounts, AppError, Badge, BadgeDefinition, BadgeRepository, Friend, FriendRequest,
    FriendshipRepository, Like, PendingRequest, PublicProfile, RequestStatus, Result, Review,
    ReviewRepository, Spot, SpotRepository, User, UserRepository, VisitedSpot,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use tracing::{debug, error, info};
use uuid::Uuid;

macro_rules! user_columns {
    () => {
        "id, username, email, profile_pic, xp, created_at"
    };
}

macro_rules! request_columns {
    () => {
        "id, sender_id, receiver_id, status, created_at, updated_at"
    };
}

macro_rules! spot_columns {
    () => {
        "id, user_id, title, description, latitude, longitude, altitude, recommended_weather, \
         visit_count, favorites_count, created_at, updated_at"
    };
}

macro_rules! visit_columns {
    () => {
        "id, user_id, spot_id, visited_at, notes, source"
    };
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(internal)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies pending migrations, including the badge definition seed.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, profile_pic, xp, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.profile_pic)
        .bind(user.xp)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error("user", user.id, "username or email already registered"))?;
        Ok(())
    }

    pub async fn insert_spot(&self, spot: &Spot) -> Result<()> {
        sqlx::query(concat!(
            "INSERT INTO spots (",
            spot_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(spot.id)
        .bind(spot.user_id)
        .bind(&spot.title)
        .bind(&spot.description)
        .bind(spot.latitude)
        .bind(spot.longitude)
        .bind(spot.altitude)
        .bind(spot.recommended_weather.map(|w| w.as_str()))
        .bind(spot.visit_count)
        .bind(spot.favorites_count)
        .bind(spot.created_at)
        .bind(spot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error("user", spot.user_id, "spot already exists"))?;
        Ok(())
    }
}

fn internal(err: sqlx::Error) -> AppError {
    error!(error = %err, "database error");
    AppError::Internal(err.to_string())
}

/// Maps constraint violations on a write to domain errors. A foreign key
/// violation means the referenced `entity` with `id` does not exist.
fn write_error(entity: &'static str, id: Uuid, conflict: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return AppError::Conflict(conflict.into());
            }
            if db.is_foreign_key_violation() {
                return AppError::not_found(entity, id);
            }
        }
        internal(err)
    }
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(internal)
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: col(row, "id")?,
        username: col(row, "username")?,
        email: col(row, "email")?,
        profile_pic: col(row, "profile_pic")?,
        xp: col(row, "xp")?,
        created_at: col(row, "created_at")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<FriendRequest> {
    Ok(FriendRequest {
        id: col(row, "id")?,
        sender_id: col(row, "sender_id")?,
        receiver_id: col(row, "receiver_id")?,
        status: col::<String>(row, "status")?.parse()?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn spot_from_row(row: &PgRow) -> Result<Spot> {
    let weather: Option<String> = col(row, "recommended_weather")?;
    Ok(Spot {
        id: col(row, "id")?,
        user_id: col(row, "user_id")?,
        title: col(row, "title")?,
        description: col(row, "description")?,
        latitude: col(row, "latitude")?,
        longitude: col(row, "longitude")?,
        altitude: col(row, "altitude")?,
        recommended_weather: weather.map(|w| w.parse()).transpose()?,
        visit_count: col(row, "visit_count")?,
        favorites_count: col(row, "favorites_count")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn visit_from_row(row: &PgRow) -> Result<VisitedSpot> {
    Ok(VisitedSpot {
        id: col(row, "id")?,
        user_id: col(row, "user_id")?,
        spot_id: col(row, "spot_id")?,
        visited_at: col(row, "visited_at")?,
        notes: col(row, "notes")?,
        source: col::<String>(row, "source")?.parse()?,
    })
}

fn badge_from_row(row: &PgRow) -> Result<Badge> {
    Ok(Badge {
        id: col(row, "id")?,
        user_id: col(row, "user_id")?,
        definition_id: col(row, "definition_id")?,
        name: col(row, "name")?,
        image_path: col(row, "image_path")?,
        created_at: col(row, "created_at")?,
    })
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(concat!("SELECT ", user_columns!(), " FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn search_users(&self, exclude: Uuid, query: &str, limit: u32) -> Result<Vec<User>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id <> $1 AND (username ILIKE $2 OR email ILIKE $2) ORDER BY username LIMIT $3"
        ))
        .bind(exclude)
        .bind(like_pattern(query))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl FriendshipRepository for PgStore {
    async fn find_request(&self, id: Uuid) -> Result<Option<FriendRequest>> {
        let row = sqlx::query(concat!("SELECT ", request_columns!(), " FROM friend_requests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(request_from_row).transpose()
    }

    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>> {
        let row = sqlx::query(concat!(
            "SELECT ",
            request_columns!(),
            " FROM friend_requests WHERE status = 'pending' \
             AND ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))"
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        row.as_ref().map(request_from_row).transpose()
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM user_friends WHERE user_id = $1 AND friend_id = $2)")
            .bind(a)
            .bind(b)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
    }

    async fn insert_request(&self, request: &FriendRequest) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        // 1. Serialize with any accept touching the same pair
        Self::lock_pair(&mut tx, request.sender_id, request.receiver_id).await?;

        // 2. Friends never get a new pending request
        let friends: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_friends WHERE user_id = $1 AND friend_id = $2)",
        )
        .bind(request.sender_id)
        .bind(request.receiver_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;
        if friends {
            return Err(AppError::Conflict("already friends".into()));
        }

        // 3. The pair index rejects a second pending request
        sqlx::query(concat!(
            "INSERT INTO friend_requests (",
            request_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(request.id)
        .bind(request.sender_id)
        .bind(request.receiver_id)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(write_error("user", request.receiver_id, "friend request already exists"))?;

        tx.commit().await.map_err(internal)?;
        Ok(())
    }

    async fn resolve_request(
        &self,
        request_id: Uuid,
        receiver_id: Uuid,
        status: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<FriendRequest>> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        // 1. Find the pair and take its lock
        let pair: Option<(Uuid, Uuid)> =
            sqlx::query_as("SELECT sender_id, receiver_id FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(internal)?;
        let Some((sender_id, stored_receiver)) = pair else {
            return Ok(None);
        };
        Self::lock_pair(&mut tx, sender_id, stored_receiver).await?;

        // 2. Flip the status; the WHERE clause makes this a compare-and-set
        let row = sqlx::query(concat!(
            "UPDATE friend_requests SET status = $3, updated_at = $4 \
             WHERE id = $1 AND receiver_id = $2 AND status = 'pending' RETURNING ",
            request_columns!()
        ))
        .bind(request_id)
        .bind(receiver_id)
        .bind(status.as_str())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let request = request_from_row(&row)?;

        // 3. Both edges, or neither
        if status == RequestStatus::Accepted {
            sqlx::query(
                "INSERT INTO user_friends (user_id, friend_id, created_at) VALUES ($1, $2, $3), ($2, $1, $3) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(request.receiver_id)
            .bind(request.sender_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        }

        tx.commit().await.map_err(internal)?;
        debug!(request_id = %request_id, status = %status, "request resolved");
        Ok(Some(request))
    }

    async fn list_pending(&self, receiver_id: Uuid) -> Result<Vec<PendingRequest>> {
        let rows = sqlx::query(
            "SELECT r.id, r.created_at, u.id AS sender_id, u.username, u.profile_pic \
             FROM friend_requests r JOIN users u ON u.id = r.sender_id \
             WHERE r.receiver_id = $1 AND r.status = 'pending' \
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        rows.iter()
            .map(|row| {
                Ok(PendingRequest {
                    id: col(row, "id")?,
                    sender: PublicProfile {
                        id: col(row, "sender_id")?,
                        username: col(row, "username")?,
                        profile_pic: col(row, "profile_pic")?,
                    },
                    created_at: col(row, "created_at")?,
                })
            })
            .collect()
    }

    async fn list_friends(&self, user_id: Uuid) -> Result<Vec<Friend>> {
        let rows = sqlx::query(
            "SELECT u.id, u.username, u.profile_pic, u.xp \
             FROM user_friends f JOIN users u ON u.id = f.friend_id \
             WHERE f.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        rows.iter()
            .map(|row| {
                Ok(Friend {
                    id: col(row, "id")?,
                    username: col(row, "username")?,
                    profile_pic: col(row, "profile_pic")?,
                    xp: col(row, "xp")?,
                })
            })
            .collect()
    }

    async fn connected_user_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT friend_id FROM user_friends WHERE user_id = $1 \
             UNION \
             SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END \
             FROM friend_requests WHERE status = 'pending' AND (sender_id = $1 OR receiver_id = $1)",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl BadgeRepository for PgStore {
    async fn list_definitions(&self) -> Result<Vec<BadgeDefinition>> {
        let rows = sqlx::query("SELECT id, name, image_path, kind, threshold FROM badge_definitions ORDER BY threshold, name")
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        rows.iter()
            .map(|row| {
                Ok(BadgeDefinition {
                    id: col(row, "id")?,
                    name: col(row, "name")?,
                    image_path: col(row, "image_path")?,
                    kind: col::<String>(row, "kind")?.parse()?,
                    threshold: col(row, "threshold")?,
                })
            })
            .collect()
    }

    async fn activity_counts(&self, user_id: Uuid) -> Result<ActivityCounts> {
        let row = sqlx::query(
            "SELECT \
               (SELECT COUNT(*) FROM reviews WHERE user_id = $1) AS reviews, \
               (SELECT COUNT(DISTINCT spot_id) FROM visited_spots WHERE user_id = $1) AS visits, \
               (SELECT COUNT(*) FROM spots WHERE user_id = $1) AS spots, \
               (SELECT COUNT(*) FROM user_friends WHERE user_id = $1) AS friends, \
               (SELECT COUNT(*) FROM likes WHERE user_id = $1) AS likes",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        Ok(ActivityCounts {
            reviews: col(&row, "reviews")?,
            visits: col(&row, "visits")?,
            spots: col(&row, "spots")?,
            friends: col(&row, "friends")?,
            likes: col(&row, "likes")?,
        })
    }

    async fn list_badges(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        let rows = sqlx::query(
            "SELECT id, user_id, definition_id, name, image_path, created_at FROM badges \
             WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(badge_from_row).collect()
    }

    async fn insert_badge(&self, badge: &Badge) -> Result<bool> {
        let inserted = sqlx::query(
            "INSERT INTO badges (id, user_id, definition_id, name, image_path, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (user_id, definition_id) DO NOTHING",
        )
        .bind(badge.id)
        .bind(badge.user_id)
        .bind(badge.definition_id)
        .bind(&badge.name)
        .bind(&badge.image_path)
        .bind(badge.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error("user", badge.user_id, "badge already awarded"))?
        .rows_affected();
        Ok(inserted == 1)
    }
}

impl PgStore {
    /// Transaction-scoped advisory lock on the unordered pair `(a, b)`.
    /// Request inserts and resolutions for one pair run one at a time.
    async fn lock_pair(tx: &mut sqlx::Transaction<'_, Postgres>, a: Uuid, b: Uuid) -> Result<()> {
        sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtextextended(LEAST($1, $2)::text || GREATEST($1, $2)::text, 0))",
        )
        .bind(a)
        .bind(b)
        .execute(&mut **tx)
        .await
        .map_err(internal)?;
        Ok(())
    }

    /// Locks the spot row for the rest of `tx`. Every visit write goes
    /// through here, which serializes them per spot.
    async fn lock_spot(tx: &mut sqlx::Transaction<'_, Postgres>, spot_id: Uuid) -> Result<()> {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM spots WHERE id = $1 FOR UPDATE")
            .bind(spot_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(internal)?;
        found.map(|_| ()).ok_or_else(|| AppError::not_found("spot", spot_id))
    }

    async fn insert_visit_row(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        visit: &VisitedSpot,
        on_conflict: &'static str,
    ) -> Result<u64> {
        let sql = format!(
            "INSERT INTO visited_spots ({}, visit_day) VALUES ($1, $2, $3, $4, $5, $6, $7) {on_conflict}",
            visit_columns!()
        );
        let result = sqlx::query(&sql)
            .bind(visit.id)
            .bind(visit.user_id)
            .bind(visit.spot_id)
            .bind(visit.visited_at)
            .bind(&visit.notes)
            .bind(visit.source.as_str())
            .bind(visit.visit_day())
            .execute(&mut **tx)
            .await
            .map_err(write_error("user", visit.user_id, "spot already marked as visited"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SpotRepository for PgStore {
    async fn find_spot(&self, id: Uuid) -> Result<Option<Spot>> {
        let row = sqlx::query(concat!("SELECT ", spot_columns!(), " FROM spots WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(spot_from_row).transpose()
    }

    async fn list_spots_by_owner(&self, user_id: Uuid) -> Result<Vec<Spot>> {
        let rows = sqlx::query(concat!("SELECT ", spot_columns!(), " FROM spots WHERE user_id = $1"))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.iter().map(spot_from_row).collect()
    }

    async fn list_visits(&self, user_id: Uuid) -> Result<Vec<VisitedSpot>> {
        let rows = sqlx::query(concat!(
            "SELECT ",
            visit_columns!(),
            " FROM visited_spots WHERE user_id = $1 ORDER BY visited_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(visit_from_row).collect()
    }

    async fn has_visited(&self, user_id: Uuid, spot_id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM visited_spots WHERE user_id = $1 AND spot_id = $2)",
        )
        .bind(user_id)
        .bind(spot_id)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)
    }

    async fn insert_visit(&self, visit: &VisitedSpot) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        // 1. Serialize with tracked visits of the same spot
        Self::lock_spot(&mut tx, visit.spot_id).await?;

        // 2. Once ever, whatever the source of the earlier row
        let seen = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM visited_spots WHERE user_id = $1 AND spot_id = $2)",
        )
        .bind(visit.user_id)
        .bind(visit.spot_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;
        if seen {
            return Err(AppError::Conflict("spot already marked as visited".into()));
        }

        // 3. Insert; the unique indexes still back this up
        Self::insert_visit_row(&mut tx, visit, "").await?;

        tx.commit().await.map_err(internal)?;
        Ok(())
    }

    async fn record_tracked_visit(&self, visit: &VisitedSpot) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        Self::lock_spot(&mut tx, visit.spot_id).await?;

        let inserted = Self::insert_visit_row(
            &mut tx,
            visit,
            "ON CONFLICT (user_id, spot_id, visit_day) DO NOTHING",
        )
        .await?;
        if inserted == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE spots SET visit_count = visit_count + 1 WHERE id = $1")
            .bind(visit.spot_id)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

        tx.commit().await.map_err(internal)?;
        Ok(true)
    }

    async fn insert_like(&self, like: &Like) -> Result<Spot> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        // 1. The like row; its unique key rejects a second like
        sqlx::query("INSERT INTO likes (id, user_id, spot_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(like.id)
            .bind(like.user_id)
            .bind(like.spot_id)
            .bind(like.created_at)
            .execute(&mut *tx)
            .await
            .map_err(write_error("spot", like.spot_id, "user already liked this spot"))?;

        // 2. Counter bump in the same transaction
        let row = sqlx::query(concat!(
            "UPDATE spots SET favorites_count = favorites_count + 1, updated_at = $2 WHERE id = $1 RETURNING ",
            spot_columns!()
        ))
        .bind(like.spot_id)
        .bind(like.created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?;
        let spot = match row {
            Some(row) => spot_from_row(&row)?,
            None => return Err(AppError::not_found("spot", like.spot_id)),
        };

        tx.commit().await.map_err(internal)?;
        Ok(spot)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn find_review(&self, user_id: Uuid, spot_id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query(
            "SELECT id, user_id, spot_id, text, likes, created_at FROM reviews WHERE user_id = $1 AND spot_id = $2",
        )
        .bind(user_id)
        .bind(spot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        row.as_ref()
            .map(|row| {
                Ok(Review {
                    id: col(row, "id")?,
                    user_id: col(row, "user_id")?,
                    spot_id: col(row, "spot_id")?,
                    text: col(row, "text")?,
                    likes: col(row, "likes")?,
                    created_at: col(row, "created_at")?,
                })
            })
            .transpose()
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        sqlx::query(
            "INSERT INTO reviews (id, user_id, spot_id, text, likes, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.spot_id)
        .bind(&review.text)
        .bind(review.likes)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error("spot", review.spot_id, "you've already reviewed this spot"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::VisitSource;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn visit_source_column_round_trips() {
        for source in [VisitSource::Explicit, VisitSource::Tracked] {
            assert_eq!(source.as_str().parse::<VisitSource>().unwrap(), source);
        }
    }
}
