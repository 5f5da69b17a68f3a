//! API response types
//!
//! Standard envelopes for every endpoint: a success wrapper and a structured
//! error with a machine-readable code and optional detail payload. Business
//! failures put their specifics (conflicting slot, unmet prerequisites) into
//! `details`; infrastructure failures never do.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new success response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Standard error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code (e.g. `NOT_FOUND`, `CONFLICT`)
    pub code: String,
    /// Human-readable message, specific enough to render to the user
    pub message: String,
    /// Structured failure detail for business-rule rejections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an error response carrying structured detail
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
    }

    #[test]
    fn error_envelope_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "missing")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"].get("details").is_none());

        let json = serde_json::to_value(ErrorResponse::with_details(
            "CONFLICT",
            "clash",
            serde_json::json!({"day": "Mon"}),
        ))
        .unwrap();
        assert_eq!(json["error"]["details"]["day"], "Mon");
    }
}
