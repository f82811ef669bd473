// SPDX-License-Identifier: Apache-2.0

//! The error taxonomy of §7: a closed set of kinds, not ad hoc strings. Each
//! variant carries the info needed to render the `{error:{code, message, ...}}`
//! response shape; the HTTP status mapping lives in `tradeloop-api` since this
//! crate has no opinion about transport.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Stable machine-readable error code, serialized as the `code` field of §6's
/// error response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    InvalidInput,
    NotFound,
    TooManyAssets,
    TooManyWants,
    RateLimitExceeded,
    Busy,
    Timeout,
    Internal,
}

/// The taxonomy of §7, kinds not type names: every fallible operation above the
/// transport boundary returns one of these.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid API key")]
    Unauthorized,

    #[error("admin-only endpoint")]
    Forbidden,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("wallet {wallet_id} already owns or wants the maximum of {max} assets")]
    TooManyAssets { wallet_id: String, max: usize },

    #[error("wallet {wallet_id} already wants the maximum of {max} assets")]
    TooManyWants { wallet_id: String, max: usize },

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("tenant event queue is saturated")]
    Busy,

    #[error("operation exceeded its deadline")]
    Timeout,

    #[error("internal error (request {request_id})")]
    Internal {
        request_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::Forbidden => ErrorCode::Forbidden,
            ApiError::InvalidInput(_) => ErrorCode::InvalidInput,
            ApiError::NotFound { .. } => ErrorCode::NotFound,
            ApiError::TooManyAssets { .. } => ErrorCode::TooManyAssets,
            ApiError::TooManyWants { .. } => ErrorCode::TooManyWants,
            ApiError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            ApiError::Busy => ErrorCode::Busy,
            ApiError::Timeout => ErrorCode::Timeout,
            ApiError::Internal { .. } => ErrorCode::Internal,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    pub fn internal(request_id: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal {
            request_id: request_id.into(),
            source: source.into(),
        }
    }
}
