// SPDX-License-Identifier: Apache-2.0

//! §7 error taxonomy -> HTTP status + `{error:{code,message,details?,
//! timestamp,requestId?}}` body. This is the one place `ApiError` meets a
//! transport, per its own doc comment.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tradeloop_common::{ApiError, ErrorCode, RequestId};

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_ms: Option<u64>,
    timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<RequestId>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

pub struct ApiErrorResponse {
    pub error: ApiError,
    pub request_id: Option<RequestId>,
}

impl ApiErrorResponse {
    pub fn new(error: ApiError) -> Self {
        Self { error, request_id: None }
    }

    pub fn with_request_id(error: ApiError, request_id: RequestId) -> Self {
        Self {
            error,
            request_id: Some(request_id),
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self::new(error)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::TooManyAssets | ErrorCode::TooManyWants => StatusCode::BAD_REQUEST,
        ErrorCode::RateLimitExceeded | ErrorCode::Busy => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Timeout => StatusCode::REQUEST_TIMEOUT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let code = self.error.code();
        let status = status_for(code);

        if matches!(code, ErrorCode::Internal) {
            tracing::error!(error = %self.error, "internal error");
        }

        let retry_after_ms = self.error.retry_after().map(|d| d.as_millis() as u64);

        let body = ErrorEnvelope {
            error: ErrorBody {
                code,
                message: self.error.to_string(),
                details: None,
                retry_after_ms,
                timestamp: now_millis(),
                request_id: self.request_id,
            },
        };

        (status, Json(body)).into_response()
    }
}
