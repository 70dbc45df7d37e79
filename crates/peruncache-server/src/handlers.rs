//! HTTP handlers for the peer RPC surface.
//!
//! The wire contract is deliberately thin: the request is the
//! `{group}/{key}` pair in the path, a successful response is the value's
//! raw bytes, and failures are JSON error bodies. The owning group does
//! the real work through `Group::get`.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use peruncache_core::{get_group, Error};

use crate::types::ErrorResponse;

/// Health probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serves `GET /_peruncache/{group}/{key}` for remote peers.
///
/// The group read runs on the blocking pool: the core pipeline is
/// synchronous and may itself wait on an origin fetch.
pub async fn get_value(Path((group_name, key)): Path<(String, String)>) -> Response {
    tracing::info!("peer request: ({})/({})", group_name, key);

    let Some(group) = get_group(&group_name) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &Error::GroupNotFound(group_name),
        );
    };

    match tokio::task::spawn_blocking(move || group.get(&key)).await {
        Ok(Ok(view)) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Ok(Err(err @ Error::EmptyKey)) => error_response(StatusCode::BAD_REQUEST, &err),
        Ok(Err(err)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err),
        Err(join_err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &Error::internal(format!("cache read aborted: {join_err}")),
        ),
    }
}

fn error_response(status: StatusCode, err: &Error) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
