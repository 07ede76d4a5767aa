//! Response helpers shared by the handlers
//!
//! Image endpoints answer in plain text on failure. Only unknown sizes are
//! the caller's fault; every other failure is reported as temporary, with
//! the detail kept in the logs.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::services::OUTPUT_CONTENT_TYPE;

/// Body for every failure other than an unknown size
pub const UNAVAILABLE_MESSAGE: &str = "Unable to return an image at this moment, try again in a bit";

/// Successful image response; never cached downstream so every request re-rolls
pub fn image_response(bytes: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(OUTPUT_CONTENT_TYPE)),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        bytes,
    )
        .into_response()
}

/// Map a dispatch error to its HTTP response
pub fn error_response(error: &AppError) -> Response {
    match error {
        AppError::UnknownSize { valid, .. } => (
            StatusCode::BAD_REQUEST,
            format!("The URL needs to end with one of: {}", valid.join(", ")),
        )
            .into_response(),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, HeaderValue::from_static("5"))],
            UNAVAILABLE_MESSAGE,
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_size_is_bad_request() {
        let response = error_response(&AppError::UnknownSize {
            requested: "4k".to_string(),
            valid: vec!["a".to_string(), "b".to_string()],
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_errors_are_unavailable() {
        for error in [
            AppError::PoolEmpty,
            AppError::fetch("https://example.com/a.jpg", "HTTP 404"),
            AppError::internal("join failed"),
        ] {
            let response = error_response(&error);
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            assert!(response.headers().contains_key(header::RETRY_AFTER));
        }
    }

    #[test]
    fn test_image_response_headers() {
        let response = image_response(Bytes::from_static(b"\xff\xd8"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }
}
