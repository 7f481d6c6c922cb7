mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{app_with, body_text, header, send, test_config};

fn limited_app(burst: u32) -> axum::Router {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_minute = 1;
    config.rate_limit.burst = burst;
    app_with(config)
}

fn from_client(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn requests_beyond_burst_are_rejected_with_retry_after() {
    let app = limited_app(2);

    for _ in 0..2 {
        let resp = send(&app, from_client("/avatar/Jane", "203.0.113.7")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(&app, from_client("/avatar/Jane", "203.0.113.7")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&resp, "content-type"), "application/problem+json");
    let retry_after: u64 = header(&resp, "retry-after").parse().expect("retry-after");
    assert!(retry_after >= 1);

    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(json["code"], "RATE_LIMITED");
    assert_eq!(json["status"], 429);
}

#[tokio::test]
async fn clients_are_limited_independently() {
    let app = limited_app(1);

    let resp = send(&app, from_client("/placeholder/100x100", "198.51.100.1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, from_client("/placeholder/100x100", "198.51.100.1")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let resp = send(&app, from_client("/placeholder/100x100", "198.51.100.2")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_categories_are_not_limited() {
    let app = limited_app(1);

    for _ in 0..3 {
        let resp = send(&app, from_client("/health", "192.0.2.9")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = send(&app, from_client("/categories/jokes", "192.0.2.9")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn disabled_limiter_admits_everything() {
    let mut config = test_config();
    config.rate_limit.burst = 1;
    let app = app_with(config);

    for _ in 0..5 {
        let resp = send(&app, from_client("/avatar/Jane", "203.0.113.8")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
