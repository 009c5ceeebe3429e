//! # Handlers
//!
//! Thin translation between JSON and the service calls. The caller's
//! identity always comes from [`CurrentUser`], never from the body.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use domains::{AppError, Badge, Friend, FriendRequest, PendingRequest, PublicProfile, Spot, VisitedSpot};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
    /// 0 or absent selects the default page size
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct SendRequestBody {
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RequestIdBody {
    pub request_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PositionBody {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct VisitedSpotBody {
    pub spot_id: Uuid,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub spot_id: Uuid,
    pub text: String,
}

// --- Friends ---

pub async fn search_friends(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResult<Json<Vec<PublicProfile>>> {
    let found = state.friends.search_candidates(user_id, &body.query, body.limit).await?;
    Ok(Json(found))
}

pub async fn send_request(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<SendRequestBody>,
) -> ApiResult<(StatusCode, Json<FriendRequest>)> {
    let request = state.friends.send_request(user_id, body.receiver_id).await?;
    state.metrics.friend_request("sent");
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_requests(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<PendingRequest>>> {
    Ok(Json(state.friends.list_pending(user_id).await?))
}

pub async fn accept_request(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<RequestIdBody>,
) -> ApiResult<Json<Value>> {
    state.friends.accept(user_id, body.request_id).await?;
    state.metrics.friend_request("accepted");
    Ok(Json(json!({ "message": "Friend request accepted" })))
}

pub async fn decline_request(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<RequestIdBody>,
) -> ApiResult<Json<Value>> {
    state.friends.decline(user_id, body.request_id).await?;
    state.metrics.friend_request("declined");
    Ok(Json(json!({ "message": "Friend request declined" })))
}

pub async fn list_friends(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<Friend>>> {
    Ok(Json(state.friends.list_friends(user_id).await?))
}

// --- Badges ---

pub async fn check_badges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Value>> {
    let evaluation = state.badges.evaluate_and_award(user_id).await?;
    state.metrics.badges_awarded(evaluation.new_badges.len());
    Ok(Json(json!({
        "newBadges": evaluation.new_badges,
        "allBadges": evaluation.all_badges,
    })))
}

pub async fn list_badges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<Badge>>> {
    Ok(Json(state.badges.list_badges(user_id).await?))
}

// --- Spots, visits and reviews ---

pub async fn check_proximity(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<PositionBody>,
) -> ApiResult<Json<Value>> {
    let nearby = state.proximity.find_nearby(user_id, body.latitude, body.longitude).await?;
    Ok(Json(json!({ "nearbySpots": nearby })))
}

pub async fn track_visit(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(spot_id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let recorded = state.visits.track_visit(user_id, spot_id).await?;
    let message = if recorded {
        state.metrics.visit_tracked();
        "Visit tracked"
    } else {
        "Visit already tracked today"
    };
    Ok(Json(json!({ "message": message, "recorded": recorded })))
}

pub async fn like_spot(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(spot_id): ApiPath<Uuid>,
) -> ApiResult<Json<Spot>> {
    Ok(Json(state.visits.like_spot(user_id, spot_id).await?))
}

pub async fn add_visited_spot(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<VisitedSpotBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let visit = state.visits.add_visited_spot(user_id, body.spot_id, body.notes).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Spot marked as visited", "visitedSpot": visit })),
    ))
}

pub async fn list_visited(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<VisitedSpot>>> {
    Ok(Json(state.visits.list_visited(user_id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<ReviewBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let review = state.visits.create_review(user_id, body.spot_id, body.text).await?;
    state.metrics.review_created();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Review created", "review": review })),
    ))
}

// --- Operational ---

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok((
        [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
        body,
    ))
}
