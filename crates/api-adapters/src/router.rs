use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the full HTTP surface.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        // Friends
        .route("/friends", get(handlers::list_friends))
        .route("/friends/search", post(handlers::search_friends))
        .route("/friends/request", post(handlers::send_request))
        .route("/friends/requests", get(handlers::list_requests))
        .route("/friends/accept", post(handlers::accept_request))
        .route("/friends/decline", post(handlers::decline_request))
        // Badges
        .route("/badges", get(handlers::list_badges))
        .route("/badges/check", post(handlers::check_badges))
        // Spots
        .route("/spots/check-proximity", post(handlers::check_proximity))
        .route("/spots/{id}/visit", post(handlers::track_visit))
        .route("/spots/{id}/like", post(handlers::like_spot))
        .route("/visited-spots", get(handlers::list_visited).post(handlers::add_visited_spot))
        .route("/reviews", post(handlers::create_review))
        // Operational
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}
