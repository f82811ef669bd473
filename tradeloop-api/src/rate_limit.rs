// SPDX-License-Identifier: Apache-2.0

//! Thin bridge between the process-wide `RateLimiter` and the `ApiError`
//! taxonomy, so handlers never touch `RateLimitError` directly.

use std::sync::Arc;

use tradeloop_common::{ApiError, TenantId};
use tradeloop_identity::{RateLimitDimension, RateLimitError, RateLimits};

use crate::state::AppState;

pub fn check(
    state: &Arc<AppState>,
    tenant_id: TenantId,
    dimension: RateLimitDimension,
    limits: &RateLimits,
) -> Result<(), ApiError> {
    state
        .rate_limiter
        .check_and_record(tenant_id, dimension, limits)
        .map_err(|RateLimitError::Exceeded(_, retry_after)| ApiError::RateLimited { retry_after })
}
