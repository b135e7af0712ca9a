/*
 * tests/integrations.rs
 *
 * Integration tests for the server
 *
 * Purpose:
 *   Spawning one instance of the server and calling the planning-policy endpoints over
 *   concurrent HTTP requests.
 *
 * How to make new tests:
 *   Create a regular async function WITHOUT `#[tokio::test]`.
 *   In test_endpoints below, there is a tokio::join macro at the bottom of the function which
 *   contains all the tests. Just call your function in that join macro similar to the others.
 */

extern crate journey_planning_policy as app;
use app::controllers;
use app::state::AppState;
use axum::{Extension, Router};
use httpc_test::Client;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

static TEST_LOG_INIT: Once = Once::new();

#[tokio::test]
async fn test_endpoints() {
    _ = dotenvy::dotenv();

    TEST_LOG_INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            unsafe { std::env::set_var("RUST_LOG", "debug") };
        }
        app::log::init_panic_handler();
        app::log::init_logger();
    });

    let state = Arc::new(AppState::default());
    let api_routes = Router::new().nest("/planning-policy", controllers::planning_policy::planning_policy_routes());
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(Extension(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    let hc = httpc_test::new_client(format!("http://{}", addr)).unwrap();

    tokio::join!(
        async { test_compile_policy_happy_path(&hc).await },
        async { test_compile_policy_rejects_empty_travelers(&hc).await },
        async { test_schedule_single_poi_always_open(&hc).await },
        async { test_seed_for_candidate_matches_formula(&hc).await },
        async { test_evaluate_day_robustness_scenario_one(&hc).await },
    );
}

async fn test_compile_policy_happy_path(hc: &Client) {
    let resp = hc
        .do_post(
            "/api/planning-policy/policy/compile",
            json!({
                "travelers": [
                    {"mobility": "city-potato", "interest": "ADULT", "weight": 1.0}
                ],
                "context": {},
                "trip_type": "leisure",
                "budget_per_person_per_day": null
            }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json_body().unwrap();
    assert_eq!(body["success"], true);
    assert!(body["data"]["policy"]["pacing"]["hp_max"].as_f64().unwrap() > 0.0);
}

async fn test_compile_policy_rejects_empty_travelers(hc: &Client) {
    let resp = hc
        .do_post(
            "/api/planning-policy/policy/compile",
            json!({
                "travelers": [],
                "context": {},
                "trip_type": "leisure",
                "budget_per_person_per_day": null
            }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body = resp.json_body().unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

fn always_open_poi() -> serde_json::Value {
    json!({
        "id": "poi-1",
        "name": "Museum",
        "lat": 0.001,
        "lng": 0.001,
        "tags": ["museum"],
        "opening_hours": null,
        "avg_visit_min": 60.0,
        "visit_min_std": null,
        "queue_min_mean": null,
        "queue_min_std": null,
        "wheelchair_access": true,
        "stairs_required": false,
        "seating_available": true,
        "restroom_nearby": true,
        "weather_sensitivity": 0,
        "crowding_key": null
    })
}

async fn compiled_leisure_policy(hc: &Client) -> serde_json::Value {
    let resp = hc
        .do_post(
            "/api/planning-policy/policy/compile",
            json!({
                "travelers": [{"mobility": "city-potato", "interest": "ADULT", "weight": 1.0}],
                "context": {},
                "trip_type": "leisure",
                "budget_per_person_per_day": null
            }),
        )
        .await
        .unwrap();
    resp.json_body().unwrap()["data"]["policy"].clone()
}

async fn test_schedule_single_poi_always_open(hc: &Client) {
    let policy = compiled_leisure_policy(hc).await;
    let resp = hc
        .do_post(
            "/api/planning-policy/schedule/day",
            json!({
                "policy": policy,
                "date_ctx": {"date": "2026-07-27", "day_of_week": 1, "is_holiday": false},
                "start_min": 540,
                "end_min": 1080,
                "start_location": {"lat": 0.0, "lng": 0.0},
                "pois": [always_open_poi()],
                "rest_stops": [],
                "must_see_poi_ids": [],
                "buffer_min": 10,
                "initial_hp": null
            }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json_body().unwrap();
    let stops = body["data"]["schedule"]["stops"].as_array().unwrap();
    assert!(stops.iter().any(|s| s["id"] == "poi-1"), "schedule should include the always-open POI");
}

async fn test_seed_for_candidate_matches_formula(hc: &Client) {
    let resp = hc
        .do_get("/api/planning-policy/seed-for-candidate/42/SHIFT:poi-1:35")
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json_body().unwrap();
    let seed = body["data"]["seed"].as_u64().unwrap();
    assert_eq!(seed, app::planning::rng::seed_for_candidate(42, "SHIFT:poi-1:35") as u64);
}

async fn test_evaluate_day_robustness_scenario_one(hc: &Client) {
    let policy = compiled_leisure_policy(hc).await;
    let schedule_resp = hc
        .do_post(
            "/api/planning-policy/schedule/day",
            json!({
                "policy": policy,
                "date_ctx": {"date": "2026-07-27", "day_of_week": 1, "is_holiday": false},
                "start_min": 540,
                "end_min": 1080,
                "start_location": {"lat": 0.0, "lng": 0.0},
                "pois": [always_open_poi()],
                "rest_stops": [],
                "must_see_poi_ids": [],
                "buffer_min": 10,
                "initial_hp": null
            }),
        )
        .await
        .unwrap();
    let schedule = schedule_resp.json_body().unwrap()["data"]["schedule"].clone();

    let resp = hc
        .do_post(
            "/api/planning-policy/robustness/evaluate-day",
            json!({
                "policy": policy,
                "schedule": schedule,
                "day_end_min": 1080,
                "date_ctx": {"date": "2026-07-27", "day_of_week": 1, "is_holiday": false},
                "pois": {"poi-1": always_open_poi()},
                "config": {"samples": 300, "seed": 42, "on_time_slack_min": null}
            }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json_body().unwrap();
    let report = &body["data"];
    assert!(report["on_time_prob"].as_f64().unwrap() >= 0.99);
    assert_eq!(report["time_window_miss_prob"].as_f64().unwrap(), 0.0);
}
