//! # Geo-Proximity Evaluator
//!
//! Finds the caller's own spots they have not visited yet and are standing
//! close to, using the haversine great-circle distance.

use std::collections::HashSet;
use std::sync::Arc;

use domains::{AppError, NearbySpot, Result, SpotRepository};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Spots at or within this distance count as nearby.
pub const PROXIMITY_THRESHOLD_METERS: f64 = 50.0;

/// Great-circle distance in meters between two points given in degrees.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
}

fn validate_position(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::InvalidArgument(format!("latitude {latitude} is out of range")));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::InvalidArgument(format!("longitude {longitude} is out of range")));
    }
    Ok(())
}

pub struct ProximityService {
    spots: Arc<dyn SpotRepository>,
}

impl ProximityService {
    pub fn new(spots: Arc<dyn SpotRepository>) -> Self {
        Self { spots }
    }

    /// Owned, unvisited spots within [`PROXIMITY_THRESHOLD_METERS`] of the
    /// given position, closest first.
    #[instrument(skip(self))]
    pub async fn find_nearby(&self, user_id: Uuid, latitude: f64, longitude: f64) -> Result<Vec<NearbySpot>> {
        validate_position(latitude, longitude)?;

        let owned = self.spots.list_spots_by_owner(user_id).await?;
        let visited: HashSet<Uuid> = self
            .spots
            .list_visits(user_id)
            .await?
            .into_iter()
            .map(|visit| visit.spot_id)
            .collect();

        let mut nearby: Vec<NearbySpot> = owned
            .into_iter()
            .filter(|spot| !visited.contains(&spot.id))
            .filter_map(|spot| {
                let distance = calculate_distance(latitude, longitude, spot.latitude, spot.longitude);
                (distance <= PROXIMITY_THRESHOLD_METERS).then(|| NearbySpot {
                    spot_id: spot.id,
                    title: spot.title,
                    distance,
                    latitude: spot.latitude,
                    longitude: spot.longitude,
                })
            })
            .collect();
        nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        debug!(found = nearby.len(), "proximity check finished");
        Ok(nearby)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{MockSpotRepository, Spot, VisitSource, VisitedSpot};

    /// Degrees of latitude spanning `meters` along a meridian.
    fn meters_north(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_METERS).to_degrees()
    }

    fn spot(owner: Uuid, title: &str, latitude: f64, longitude: f64) -> Spot {
        Spot {
            id: Uuid::now_v7(),
            user_id: owner,
            title: title.into(),
            description: String::new(),
            latitude,
            longitude,
            altitude: None,
            recommended_weather: None,
            visit_count: 0,
            favorites_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn repo(spots: Vec<Spot>, visits: Vec<VisitedSpot>) -> MockSpotRepository {
        let mut repo = MockSpotRepository::new();
        repo.expect_list_spots_by_owner().returning(move |_| Ok(spots.clone()));
        repo.expect_list_visits().returning(move |_| Ok(visits.clone()));
        repo
    }

    #[test]
    fn same_point_is_zero_meters() {
        assert_eq!(calculate_distance(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn fifty_meter_fixture() {
        let d = calculate_distance(0.0, 0.0, meters_north(50.0), 0.0);
        assert!((d - 50.0).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = calculate_distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_194.93).abs() < 0.1, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let there = calculate_distance(42.0, 21.0, 41.99, 21.43);
        let back = calculate_distance(41.99, 21.43, 42.0, 21.0);
        assert!((there - back).abs() < 1e-9);
    }

    #[tokio::test]
    async fn spot_thirty_meters_away_is_nearby() {
        let user = Uuid::now_v7();
        let lake = spot(user, "Lake", 42.0, 21.0);
        let svc = ProximityService::new(Arc::new(repo(vec![lake.clone()], vec![])));

        let found = svc.find_nearby(user, 42.0 + meters_north(30.0), 21.0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spot_id, lake.id);
        assert!((found[0].distance - 30.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn spots_two_hundred_meters_or_a_kilometer_away_are_excluded() {
        let user = Uuid::now_v7();
        let svc = ProximityService::new(Arc::new(repo(vec![spot(user, "Lake", 42.0, 21.0)], vec![])));

        assert!(svc.find_nearby(user, 42.0 + meters_north(200.0), 21.0).await.unwrap().is_empty());
        assert!(svc.find_nearby(user, 42.0 + meters_north(1_000.0), 21.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn visited_spots_are_skipped_and_results_sorted() {
        let user = Uuid::now_v7();
        let far = spot(user, "Far", 42.0 + meters_north(40.0), 21.0);
        let near = spot(user, "Near", 42.0 + meters_north(10.0), 21.0);
        let seen = spot(user, "Seen", 42.0, 21.0);
        let visit = VisitedSpot::new(user, seen.id, Utc::now(), String::new(), VisitSource::Explicit);

        let svc = ProximityService::new(Arc::new(repo(vec![far, seen, near], vec![visit])));
        let found = svc.find_nearby(user, 42.0, 21.0).await.unwrap();

        let titles: Vec<&str> = found.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Near", "Far"]);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let svc = ProximityService::new(Arc::new(MockSpotRepository::new()));
        let user = Uuid::now_v7();

        assert!(matches!(svc.find_nearby(user, 91.0, 0.0).await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(svc.find_nearby(user, 0.0, f64::NAN).await, Err(AppError::InvalidArgument(_))));
    }
}
