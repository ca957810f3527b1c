use kingmaker::server::routes::route_request;

#[test]
fn health_endpoint_reports_service_metadata() {
    let response = route_request("GET", "/api/health", "");
    assert_eq!(response.status_code, 200);
    let payload: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["service"], "kingmaker-api");
    assert!(payload["version"].is_string());
}

#[test]
fn service_index_lists_endpoints() {
    let response = route_request("GET", "/", "");
    assert_eq!(response.status_code, 200);
    let payload: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    let endpoints = payload["endpoints"].as_array().unwrap();
    assert!(endpoints
        .iter()
        .any(|e| e.as_str() == Some("POST /api/simulate")));
}

#[test]
fn simulate_rejects_wrong_alliance_sizes_before_touching_the_roster() {
    let body = r#"{"red": [1, 2], "blue": [4, 5, 6]}"#;
    let response = route_request("POST", "/api/simulate", body);
    assert_eq!(response.status_code, 400);
    let payload: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("exactly 3 team numbers"));
}

#[test]
fn simulate_rejects_malformed_json() {
    let response = route_request("POST", "/api/simulate", "{oops");
    assert_eq!(response.status_code, 400);
}

#[test]
fn draft_pick_rejects_malformed_state() {
    let response = route_request("POST", "/api/draft/pick", r#"{"team": 42}"#);
    assert_eq!(response.status_code, 400);
}

#[test]
fn unknown_routes_are_not_found() {
    let response = route_request("DELETE", "/api/teams", "");
    assert_eq!(response.status_code, 404);
    let response = route_request("GET", "/api/optimizer", "");
    assert_eq!(response.status_code, 404);
}
