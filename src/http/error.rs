//! API error type and its mapping onto HTTP responses.
//!
//! | variant       | status                 | body                                  |
//! |---------------|------------------------|---------------------------------------|
//! | `Validation`  | 422                    | `{"detail": [violation, ..]}`         |
//! | `Payload`     | axum rejection status  | `{"detail": [violation]}`             |
//! | `RateLimited` | 429 + `Retry-After`    | `{"error": "Rate limit exceeded: .."}`|
//! | `Store`       | 500                    | `{"error": "internal server error"}`  |

use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// One violated request constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Path to the offending value, e.g. `["body", "query_string"]`.
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl FieldViolation {
    pub fn body(field: &str, kind: &'static str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("malformed payload: {0}")]
    Payload(#[from] JsonRejection),

    #[error("rate limit exceeded: {limit}")]
    RateLimited { limit: String, retry_after: Duration },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": violations })),
            )
                .into_response(),
            ApiError::Payload(rejection) => {
                let violation = FieldViolation {
                    loc: vec!["body".to_string()],
                    msg: rejection.body_text(),
                    kind: "payload",
                };
                (rejection.status(), Json(json!({ "detail": [violation] }))).into_response()
            }
            ApiError::RateLimited { limit, retry_after } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": format!("Rate limit exceeded: {limit}") })),
                )
                    .into_response();
                // Round up so a client never retries inside the closed window.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
                response
            }
            ApiError::Store(err) => {
                tracing::error!(error = %err, "Search backend failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_is_422_with_detail() {
        let response = ApiError::Validation(vec![FieldViolation::body(
            "query_string",
            "string_too_short",
            "String should have at least 1 character",
        )])
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": [{
                "loc": ["body", "query_string"],
                "msg": "String should have at least 1 character",
                "type": "string_too_short",
            }]})
        );
    }

    #[tokio::test]
    async fn rate_limited_is_429_with_retry_after() {
        let response = ApiError::RateLimited {
            limit: "30 per 1 minute".into(),
            retry_after: Duration::from_millis(12_300),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Rate limit exceeded: 30 per 1 minute" })
        );
    }

    #[tokio::test]
    async fn store_errors_do_not_leak_details() {
        let response =
            ApiError::Store(StoreError::Missing(PathBuf::from("/srv/secret/creds.db"))).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "internal server error" }));
        assert!(!body.to_string().contains("secret"));
    }
}
