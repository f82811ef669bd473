// SPDX-License-Identifier: Apache-2.0

//! §4.7 Identity & Quota: API key issuance and constant-time verification, plus
//! per-tenant sliding-window rate limiting on the three dimensions named in §4.7.

pub mod api_key;
pub mod rate_limit;

pub use api_key::{ApiKeyError, ApiKeySecret, StoredApiKeyHash};
pub use rate_limit::{RateLimitDimension, RateLimitError, RateLimiter, RateLimits};
