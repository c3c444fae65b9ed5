use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::SubmitError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    RateLimited { message: String, retry_after_secs: u64 },
    Internal(String),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        let message = err.to_string();
        match err {
            SubmitError::Validation(_) => ApiError::BadRequest(message),
            SubmitError::Conflict { .. } => ApiError::Conflict(
                "Another task is already in progress. Cancel it first or wait.".to_string(),
            ),
            SubmitError::RateLimited { retry_after_secs } => ApiError::RateLimited {
                message,
                retry_after_secs,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => error_body(StatusCode::BAD_REQUEST, message),
            ApiError::Conflict(message) => error_body(StatusCode::CONFLICT, message),
            ApiError::Internal(message) => error_body(StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::RateLimited {
                message,
                retry_after_secs,
            } => {
                let body = json!({
                    "status": "error",
                    "message": message,
                    "retryAfter": retry_after_secs,
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({"status": "error", "message": message}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_errors_map_to_status_codes() {
        let cases = [
            (SubmitError::Validation("empty".to_string()), StatusCode::BAD_REQUEST),
            (
                SubmitError::Conflict {
                    running: "other".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                SubmitError::RateLimited { retry_after_secs: 7 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn rate_limit_carries_retry_after_header() {
        let response = ApiError::from(SubmitError::RateLimited { retry_after_secs: 12 }).into_response();
        assert_eq!(
            response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
            Some("12")
        );
    }
}
