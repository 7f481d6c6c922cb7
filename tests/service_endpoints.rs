mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{app, body_text, get, header, send};

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let resp = get(&app, "/health").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "grout");
}

#[tokio::test]
async fn categories_are_listed_for_known_kinds() {
    let app = app();
    let resp = get(&app, "/categories/quotes").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(json["kind"], "quote");
    let categories: Vec<&str> = json["categories"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(categories.contains(&"programming"));

    let resp = get(&app, "/categories/joke").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_kind_is_a_problem_response() {
    let app = app();
    let resp = get(&app, "/categories/memes").await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&resp, "content-type"), "application/problem+json");
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let app = app();
    let resp = get(&app, "/health").await;
    assert!(header(&resp, "x-request-id").starts_with("req_"));
}

#[tokio::test]
async fn problem_details_carry_client_request_id() {
    let app = app();
    let req = Request::builder()
        .uri("/categories/memes")
        .header("x-request-id", "client.req-001")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;

    assert_eq!(header(&resp, "x-request-id"), "client.req-001");
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(json["requestId"], "client.req-001");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let resp = get(&app, "/api-docs/openapi.json").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert!(json["paths"]["/avatar/{name}"].is_object());
    assert!(json["paths"]["/placeholder/{dimensions}"].is_object());
}
