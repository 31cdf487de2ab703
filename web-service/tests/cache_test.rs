mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, TestApp, TestAppBuilder};
use serde_json::json;

#[tokio::test]
async fn stored_json_is_returned_parsed() {
    let app = TestAppBuilder::new()
        .cache_entry("profile", r#"{"name":"ada","langs":["en","fr"]}"#)
        .build();

    let response = app.get("/cache/profile").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"], json!({ "name": "ada", "langs": ["en", "fr"] }));
    assert_eq!(body["meta"]["message"], "Data retrieved correctly.");
}

#[tokio::test]
async fn missing_key_reads_as_null() {
    let app = TestApp::spawn();

    let response = app.get("/cache/nothing-here").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::Value::Null);
    assert_eq!(body["meta"]["status"], "success");
    assert_eq!(body["meta"]["message"], "Data retrieved correctly.");
}

#[tokio::test]
async fn unparsable_value_is_not_found() {
    let app = TestAppBuilder::new().cache_entry("raw", "not json").build();

    let response = app.get("/cache/raw").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["data"], false);
    assert_eq!(body["meta"]["message"], "Data not found.");
}

#[tokio::test]
async fn listing_the_cache_is_forbidden() {
    let app = TestApp::spawn();

    let response = app.get("/cache").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(
        body["meta"]["message"],
        "There is no data available at this endpoint."
    );
}

#[tokio::test]
async fn post_stores_every_query_pair_as_json_string() {
    let app = TestApp::spawn();

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/cache?city=Lisbon&visits=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], true);
    assert_eq!(body["meta"]["message"], "Input processed and stored correctly.");

    assert_eq!(app.cache.value("city").as_deref(), Some("\"Lisbon\""));
    assert_eq!(app.cache.value("visits").as_deref(), Some("\"3\""));

    let body = body_json(app.get("/cache/city").await).await;
    assert_eq!(body["data"], "Lisbon");
}

#[tokio::test]
async fn repeated_query_key_is_stored_as_array() {
    let app = TestApp::spawn();

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/cache?tag=a&city=Porto&tag=b")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.cache.value("tag").as_deref(), Some(r#"["a","b"]"#));
    assert_eq!(app.cache.value("city").as_deref(), Some("\"Porto\""));

    let body = body_json(app.get("/cache/tag").await).await;
    assert_eq!(body["data"], json!(["a", "b"]));
}
