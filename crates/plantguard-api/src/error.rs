//! API error types and JSON error response formatting.
//!
//! Every failure leaves the service as `{error, code, suggestion?}`.
//! Internal failures are logged here and answered with a generic message.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plantguard_chat::ChatError;
use plantguard_vision::{ValidationError, VisionError};
use serde::{Deserialize, Serialize};

/// Message shown for every 500.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message shown when an upload exceeds the body limit.
pub const IMAGE_TOO_LARGE_MESSAGE: &str =
    "Image file is too large. Please upload a smaller photo of your plant.";

/// Message shown when no weather could be fetched.
pub const WEATHER_UNAVAILABLE_MESSAGE: &str = "Unable to fetch weather data";

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message, safe to show to end users.
    pub error: String,
    /// Machine-readable error code (e.g. "low_confidence").
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - the request or its content cannot be processed.
    BadRequest {
        code: &'static str,
        message: String,
        suggestion: Option<String>,
    },
    /// 413 - the upload is over `server.max_upload_bytes`.
    PayloadTooLarge,
    /// 429 - rate limit exceeded.
    TooManyRequests,
    /// 500 - unexpected failure. The detail is logged, never returned.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn weather_unavailable() -> Self {
        Self::bad_request("weather_unavailable", WEATHER_UNAVAILABLE_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest {
                code,
                message,
                suggestion,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    code: code.to_string(),
                    suggestion,
                },
            ),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    error: IMAGE_TOO_LARGE_MESSAGE.to_string(),
                    code: "image_too_large".to_string(),
                    suggestion: None,
                },
            ),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    error: "Rate limit exceeded".to_string(),
                    code: "too_many_requests".to_string(),
                    suggestion: None,
                },
            ),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: INTERNAL_ERROR_MESSAGE.to_string(),
                        code: "internal_error".to_string(),
                        suggestion: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn validation_code(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingImage | ValidationError::NoFileSelected => "missing_image",
        ValidationError::UnsupportedType { .. } => "unsupported_type",
        ValidationError::Corrupted => "corrupted_image",
        ValidationError::TooSmall { .. } => "image_too_small",
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(validation_code(&err), err.to_string())
    }
}

impl From<VisionError> for ApiError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Validation(v) => v.into(),
            VisionError::LowConfidence { .. } => ApiError::BadRequest {
                code: "low_confidence",
                message: err.to_string(),
                suggestion: err.suggestion().map(str::to_string),
            },
            VisionError::Classifier(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let code = match err {
            ChatError::EmptyMessage => "empty_message",
            ChatError::MessageTooLong(_) => "message_too_long",
        };
        ApiError::bad_request(code, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::info!(error = %err.body_text(), "Upload rejected by body limit");
            ApiError::PayloadTooLarge
        } else {
            ApiError::Internal(format!("multipart: {}", err.body_text()))
        }
    }
}
