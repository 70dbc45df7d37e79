//! Integration tests for the peer RPC surface, driven in-process through
//! the axum router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use peruncache_core::{destroy_group, new_group, Error, Group};
use peruncache_server::CacheServer;

/// Registers the reference scores group under a test-unique name.
fn scores_group(name: &str) -> Arc<Group> {
    new_group(name, 2 << 10, |key: &str| match key {
        "Tom" => Ok(b"630".to_vec()),
        "Jack" => Ok(b"589".to_vec()),
        "Sam" => Ok(b"567".to_vec()),
        "odd key" => Ok(b"ok".to_vec()),
        _ => Err(Error::retrieval(format!("{key} not exist"))),
    })
}

fn test_server() -> Arc<CacheServer> {
    CacheServer::new("localhost:9100").expect("valid test address")
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let response = test_server()
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn known_key_returns_raw_bytes() {
    let _group = scores_group("rpc-hit");

    let response = test_server()
        .router()
        .oneshot(
            Request::builder()
                .uri("/_peruncache/rpc-hit/Tom")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&body[..], b"630");

    destroy_group("rpc-hit");
}

#[tokio::test]
async fn url_encoded_keys_are_decoded_before_lookup() {
    let _group = scores_group("rpc-encoded");

    let response = test_server()
        .router()
        .oneshot(
            Request::builder()
                .uri("/_peruncache/rpc-encoded/odd%20key")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&body[..], b"ok");

    destroy_group("rpc-encoded");
}

#[tokio::test]
async fn unknown_group_is_a_404_with_json_error() {
    let response = test_server()
        .router()
        .oneshot(
            Request::builder()
                .uri("/_peruncache/no-such-group/Tom")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["error"], "group 'no-such-group' not found");
}

#[tokio::test]
async fn origin_miss_surfaces_the_origin_error() {
    let _group = scores_group("rpc-miss");

    let response = test_server()
        .router()
        .oneshot(
            Request::builder()
                .uri("/_peruncache/rpc-miss/Nobody")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["error"], "Nobody not exist");

    destroy_group("rpc-miss");
}
