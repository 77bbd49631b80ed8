//! tests/rate_limit.rs
//! Fixed-window rate limiting on the authentication tier.

mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn auth_tier_cuts_off_after_ten_attempts_in_the_window() {
    let (base_url, _state) = common::spawn_app();
    let client: reqwest::Client = reqwest::Client::new();
    let payload: Value = json!({ "email": "mallory@example.com", "password": "guess-1" });

    // The first ten attempts get through to the handler (and fail auth).
    for _ in 0..10 {
        let resp: reqwest::Response = client
            .post(format!("{}/api/auth/login", base_url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // The eleventh is rejected by the limiter before the handler runs.
    let resp: reqwest::Response = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "RATE_LIMIT");
    assert_eq!(
        body["errors"][0]["message"],
        "Too many authentication attempts, please try again later."
    );
}

#[tokio::test]
async fn default_tier_leaves_normal_traffic_alone() {
    let (base_url, _state) = common::spawn_app();
    let client: reqwest::Client = reqwest::Client::new();

    // Well under the default tier's budget of 100 per window.
    for _ in 0..20 {
        let resp: reqwest::Response = client
            .get(format!("{}/api/products/507f1f77bcf86cd799439011", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
