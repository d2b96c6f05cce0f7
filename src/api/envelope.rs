// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uniform JSON response envelope.
//!
//! Every `/v1` JSON response is rewrapped as
//!
//! ```json
//! {"status":"success","message":"…","data":…,"timestamp":"…","path":"/v1/…"}
//! ```
//!
//! and every error as
//!
//! ```json
//! {"status":"error","message":"…","statusCode":403,"error_code":"…","timestamp":"…","path":"/v1/…"}
//! ```
//!
//! Handlers stay envelope-unaware: they return plain payloads, and a
//! top-level string `message` field in a success payload is hoisted into
//! the envelope. Messages default from the request method. In production
//! the message of any 5xx collapses to a generic one so internal detail
//! never reaches clients.

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// Responses larger than this pass through unwrapped; nothing the API
/// serves should come close.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

const REDACTED_MESSAGE: &str = "Internal server error";

fn default_message(method: &Method) -> &'static str {
    match *method {
        Method::POST => "Created successfully",
        Method::PUT | Method::PATCH => "Updated successfully",
        Method::DELETE => "Deleted successfully",
        _ => "Retrieved successfully",
    }
}

fn success_envelope(method: &Method, path: &str, body: Value) -> Value {
    let mut message = default_message(method).to_string();
    let data = match body {
        Value::Object(mut map) => {
            if let Some(Value::String(m)) = map.remove("message") {
                message = m;
            }
            if map.is_empty() {
                None
            } else {
                Some(Value::Object(map))
            }
        }
        Value::Null => None,
        other => Some(other),
    };

    let mut envelope = json!({
        "status": "success",
        "message": message,
        "timestamp": Utc::now().to_rfc3339(),
        "path": path,
    });
    if let Some(data) = data {
        envelope["data"] = data;
    }
    envelope
}

fn error_envelope(status: StatusCode, path: &str, body: Value, redact: bool) -> Value {
    let mut message = body
        .get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
    if redact && status.is_server_error() {
        message = REDACTED_MESSAGE.to_string();
    }

    let mut envelope = json!({
        "status": "error",
        "message": message,
        "statusCode": status.as_u16(),
        "timestamp": Utc::now().to_rfc3339(),
        "path": path,
    });
    if !(redact && status.is_server_error()) {
        if let Some(code) = body.get("error_code").and_then(Value::as_str) {
            envelope["error_code"] = json!(code);
        }
    }
    envelope
}

/// Middleware entry point, applied to the `/v1` subtree.
pub async fn wrap_response(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, %path, "failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    let envelope = if parts.status.is_success() {
        success_envelope(&method, &path, value)
    } else {
        error_envelope(parts.status, &path, value, state.production)
    };

    (parts.status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::IdentityClassifier;
    use crate::directory::Directory;
    use crate::error::ApiError;
    use crate::identity::{FixtureIdentity, IdentityService};
    use axum::{middleware, routing::get, routing::post, Router};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(
            Directory::new(),
            IdentityService::Fixture(FixtureIdentity::new()),
            IdentityClassifier::new(vec![]),
        )
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/v1/thing", get(|| async { Json(json!({"id": 7})) }))
            .route(
                "/v1/thing",
                post(|| async { Json(json!({"message": "Thing made", "id": 8})) }),
            )
            .route(
                "/v1/missing",
                get(|| async { Err::<Json<Value>, _>(ApiError::not_found("Thing not found")) }),
            )
            .route(
                "/v1/broken",
                get(|| async { Err::<Json<Value>, _>(ApiError::internal("db exploded")) }),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                wrap_response,
            ))
            .with_state(state)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_is_wrapped_with_method_default_message() {
        let app = app(state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/thing")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Retrieved successfully");
        assert_eq!(body["data"]["id"], 7);
        assert_eq!(body["path"], "/v1/thing");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn handler_message_is_hoisted() {
        let app = app(state());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/v1/thing")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["message"], "Thing made");
        assert_eq!(body["data"]["id"], 8);
        assert!(body["data"].get("message").is_none());
    }

    #[tokio::test]
    async fn errors_carry_status_code_and_message() {
        let app = app(state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/missing")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Thing not found");
        assert_eq!(body["statusCode"], 404);
    }

    #[tokio::test]
    async fn production_redacts_server_errors() {
        let app = app(state().with_production(true));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/broken")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn development_keeps_server_error_detail() {
        let app = app(state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/broken")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["message"], "db exploded");
    }
}
