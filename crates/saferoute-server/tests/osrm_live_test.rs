//! Live OSRM integration tests.
//!
//! Run with: cargo test --test osrm_live_test -- --ignored

use reqwest::Client;

use saferoute_core::{is_path_safe, AvoidanceRules, DangerZone, Point};
use saferoute_server::osrm::OsrmClient;
use saferoute_server::{Config, OnlineRouter, RoutingBackend};

fn osrm() -> OsrmClient {
    let base = std::env::var("SAFEROUTE_TEST_OSRM_URL")
        .unwrap_or_else(|_| "https://router.project-osrm.org".to_string());
    let config = Config {
        osrm_url: base,
        ..Config::default()
    };
    OsrmClient::from_config(Client::new(), &config)
}

/// Two points about 1 km apart in central Berlin.
fn berlin() -> (Point, Point) {
    (Point::new(52.5163, 13.3777), Point::new(52.5200, 13.3900))
}

#[tokio::test]
#[ignore]
async fn test_directions_and_snap() {
    let client = osrm();
    let (start, end) = berlin();

    let route = client
        .fetch_route(&[start, end])
        .await
        .expect("OSRM route");
    assert!(route.len() >= 2);
    assert!(route.distance_m() > 500.0);

    let snapped = client.snap(start).await.expect("snapped point");
    assert!(saferoute_core::distance_m(snapped, start) < 200.0);
}

#[tokio::test]
#[ignore]
async fn test_online_router_avoids_zone() {
    let (start, end) = berlin();
    let midpoint = start.lerp(end, 0.5);
    let zones = vec![DangerZone::new(midpoint.lat, midpoint.lon, 80.0).with_id("live-test")];

    let router = OnlineRouter::new(osrm(), AvoidanceRules::default());
    let route = router
        .route(start, end, &zones)
        .await
        .expect("safe route around the zone");
    assert!(is_path_safe(route.points(), &zones));
}
