//! End-to-end flows over HTTP with real JWTs and the in-memory store.

use std::sync::Arc;

use api_adapters::{router, AppState};
use auth_adapters::{JwtIdentityResolver, TOKEN_TTL_HOURS};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use integration_tests::{meters_north, World};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    world: World,
    jwt: Arc<JwtIdentityResolver>,
    app: Router,
}

impl Harness {
    fn new() -> Self {
        let world = World::new();
        let jwt = Arc::new(JwtIdentityResolver::new(&SecretString::from("test-secret".to_string())));
        let state = AppState::from_store(world.store.clone(), jwt.clone(), world.clock.clone());
        Self { app: router(state), world, jwt }
    }

    fn token(&self, user_id: Uuid) -> String {
        self.jwt.issue(user_id, TOKEN_TTL_HOURS).unwrap()
    }

    async fn call(&self, method: Method, uri: &str, as_user: Uuid, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(as_user)));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(&self, uri: &str, as_user: Uuid) -> (StatusCode, Value) {
        self.call(Method::GET, uri, as_user, None).await
    }

    async fn post(&self, uri: &str, as_user: Uuid, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, as_user, Some(body)).await
    }
}

#[tokio::test]
async fn friend_request_round_trip() {
    let h = Harness::new();
    let (ana, bojan) = (h.world.user("ana").await.id, h.world.user("bojan").await.id);

    let (status, request) = h.post("/friends/request", ana, json!({ "receiver_id": bojan })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");

    let (status, _) = h.post("/friends/request", ana, json!({ "receiver_id": bojan })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, pending) = h.get("/friends/requests", bojan).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending[0]["sender"]["username"], "ana");

    let (status, body) = h.post("/friends/accept", bojan, json!({ "request_id": request["id"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Friend request accepted");

    let (_, friends) = h.get("/friends", ana).await;
    assert_eq!(friends[0]["username"], "bojan");
    let (_, friends) = h.get("/friends", bojan).await;
    assert_eq!(friends[0]["username"], "ana");
}

#[tokio::test]
async fn accepting_someone_elses_request_is_401() {
    let h = Harness::new();
    let (ana, bojan) = (h.world.user("ana").await.id, h.world.user("bojan").await.id);

    let (_, request) = h.post("/friends/request", ana, json!({ "receiver_id": bojan })).await;
    let (status, body) = h.post("/friends/accept", ana, json!({ "request_id": request["id"] })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn search_excludes_friends() {
    let h = Harness::new();
    let marko = h.world.user("marko").await;
    let marta = h.world.user("marta").await;
    let marija = h.world.user("marija").await;
    h.world.befriend(&marko, &marta).await;

    let (status, found) = h.post("/friends/search", marko.id, json!({ "query": "mar" })).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = found.as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, [marija.id.to_string()]);
}

#[tokio::test]
async fn badge_check_reports_new_badges_once() {
    let h = Harness::new();
    let ana = h.world.user("ana").await;
    let bojan = h.world.user("bojan").await;
    h.world.befriend(&ana, &bojan).await;

    let (status, first) = h.post("/badges/check", ana.id, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["newBadges"][0]["name"], "Friendly");
    assert_eq!(first["allBadges"].as_array().unwrap().len(), 1);

    let (_, second) = h.post("/badges/check", ana.id, json!({})).await;
    assert!(second["newBadges"].as_array().unwrap().is_empty());

    let (_, held) = h.get("/badges", ana.id).await;
    assert_eq!(held.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn visit_review_and_like_flow() {
    let h = Harness::new();
    let ana = h.world.user("ana").await;
    let bojan = h.world.user("bojan").await;
    let ridge = h.world.spot(ana.id, "Ridge", 41.99, 21.43).await;

    let (status, _) = h.post("/reviews", bojan.id, json!({ "spot_id": ridge.id, "text": "lovely" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h.post("/visited-spots", ana.id, json!({ "spot_id": ridge.id, "notes": "foggy" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["visitedSpot"]["notes"], "foggy");
    let (status, _) = h.post("/visited-spots", ana.id, json!({ "spot_id": ridge.id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = h.post("/visited-spots", bojan.id, json!({ "spot_id": ridge.id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/spots/{}/visit", ridge.id);
    let (status, body) = h.call(Method::POST, &uri, bojan.id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recorded"], true);
    let (_, body) = h.call(Method::POST, &uri, bojan.id, None).await;
    assert_eq!(body["recorded"], false);

    let (status, body) = h.post("/reviews", bojan.id, json!({ "spot_id": ridge.id, "text": "lovely" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["review"]["text"], "lovely");
    let (status, _) = h.post("/reviews", bojan.id, json!({ "spot_id": ridge.id, "text": "again" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let like = format!("/spots/{}/like", ridge.id);
    let (status, spot) = h.call(Method::POST, &like, bojan.id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spot["favorites_count"], 1);
    let (status, _) = h.call(Method::POST, &like, bojan.id, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, visited) = h.get("/visited-spots", bojan.id).await;
    assert_eq!(visited.as_array().unwrap().len(), 1);
    assert_eq!(visited[0]["source"], "tracked");
}

#[tokio::test]
async fn proximity_reports_owned_unvisited_spots() {
    let h = Harness::new();
    let ana = h.world.user("ana").await;
    let lake = h.world.spot(ana.id, "Lake", 42.0, 21.0).await;

    let position = json!({ "latitude": 42.0 + meters_north(30.0), "longitude": 21.0 });
    let (status, body) = h.post("/spots/check-proximity", ana.id, position.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nearbySpots"][0]["spotId"], lake.id.to_string());

    h.world.clock.advance(Duration::minutes(1));
    h.call(Method::POST, &format!("/spots/{}/visit", lake.id), ana.id, None).await;

    let (_, body) = h.post("/spots/check-proximity", ana.id, position).await;
    assert!(body["nearbySpots"].as_array().unwrap().is_empty());

    let (status, _) = h.post("/spots/check-proximity", ana.id, json!({ "latitude": 95.0, "longitude": 0.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let h = Harness::new();
    let ana = h.world.user("ana").await;
    let forged = JwtIdentityResolver::new(&SecretString::from("other-secret".to_string()))
        .issue(ana.id, TOKEN_TTL_HOURS)
        .unwrap();

    let request = Request::get("/friends")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn counters_follow_successful_actions() {
    let h = Harness::new();
    let (ana, bojan) = (h.world.user("ana").await.id, h.world.user("bojan").await.id);

    let (_, request) = h.post("/friends/request", ana, json!({ "receiver_id": bojan })).await;
    h.post("/friends/decline", bojan, json!({ "request_id": request["id"] })).await;

    let response = h
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains(r#"friend_requests_total{action="sent"} 1"#));
    assert!(text.contains(r#"friend_requests_total{action="declined"} 1"#));
    assert!(text.contains("badges_awarded_total 0"));
}
