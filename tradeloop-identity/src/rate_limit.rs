// SPDX-License-Identifier: Apache-2.0

//! Sliding-window rate limiting on the three dimensions of §4.7: discovery
//! requests/min, asset submissions/day, webhook calls/min. Each tenant gets an
//! independent window per dimension via a `DashMap` keyed by `(TenantId,
//! RateLimitDimension)`, the same "shard by key, lock per shard" shape
//! `wallet-indexer::application` uses for its per-wallet semaphores.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use thiserror::Error;
use tradeloop_common::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitDimension {
    DiscoveryRequestsPerMinute,
    AssetSubmissionsPerDay,
    WebhookCallsPerMinute,
}

impl RateLimitDimension {
    fn window(self) -> Duration {
        match self {
            RateLimitDimension::DiscoveryRequestsPerMinute => Duration::from_secs(60),
            RateLimitDimension::AssetSubmissionsPerDay => Duration::from_secs(86_400),
            RateLimitDimension::WebhookCallsPerMinute => Duration::from_secs(60),
        }
    }
}

/// Per-tenant caps, one field per dimension, sourced from tenant config (§3
/// Tenant's "rate-limit config").
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct RateLimits {
    pub discovery_requests_per_minute: u32,
    pub asset_submissions_per_day: u32,
    pub webhook_calls_per_minute: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            discovery_requests_per_minute: 60,
            asset_submissions_per_day: 10_000,
            webhook_calls_per_minute: 120,
        }
    }
}

impl RateLimits {
    fn cap(&self, dimension: RateLimitDimension) -> u32 {
        match dimension {
            RateLimitDimension::DiscoveryRequestsPerMinute => self.discovery_requests_per_minute,
            RateLimitDimension::AssetSubmissionsPerDay => self.asset_submissions_per_day,
            RateLimitDimension::WebhookCallsPerMinute => self.webhook_calls_per_minute,
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded for {0:?}, retry after {1:?}")]
    Exceeded(RateLimitDimension, Duration),
}

/// Process-wide sliding-window counter store (§5: "the only process-wide shared
/// state is the Tenant Registry ... and a global rate-limit counter store").
#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<(TenantId, RateLimitDimension), Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one unit of usage against `dimension` for `tenant_id`, rejecting
    /// it with `RateLimitError::Exceeded` if the cap in `limits` would be
    /// exceeded. Rejected attempts do not touch the graph or any other state —
    /// the caller must check this before doing any work (§8 property 8).
    pub fn check_and_record(
        &self,
        tenant_id: TenantId,
        dimension: RateLimitDimension,
        limits: &RateLimits,
    ) -> Result<(), RateLimitError> {
        let now = Instant::now();
        let window = dimension.window();
        let cap = limits.cap(dimension) as usize;

        let entry = self
            .windows
            .entry((tenant_id, dimension))
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut timestamps = entry.lock();

        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= cap {
            let oldest = *timestamps.front().expect("cap > 0 implies non-empty");
            let retry_after = window.saturating_sub(now.duration_since(oldest));
            return Err(RateLimitError::Exceeded(dimension, retry_after));
        }

        timestamps.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_request_in_a_five_cap_window_is_rejected() {
        let limiter = RateLimiter::new();
        let tenant = TenantId::new();
        let limits = RateLimits {
            discovery_requests_per_minute: 5,
            ..RateLimits::default()
        };

        for _ in 0..5 {
            limiter
                .check_and_record(
                    tenant,
                    RateLimitDimension::DiscoveryRequestsPerMinute,
                    &limits,
                )
                .expect("within cap");
        }

        let sixth = limiter.check_and_record(
            tenant,
            RateLimitDimension::DiscoveryRequestsPerMinute,
            &limits,
        );

        assert!(matches!(sixth, Err(RateLimitError::Exceeded(_, retry_after)) if retry_after > Duration::ZERO));
    }

    #[test]
    fn tenants_have_independent_windows() {
        let limiter = RateLimiter::new();
        let a = TenantId::new();
        let b = TenantId::new();
        let limits = RateLimits {
            discovery_requests_per_minute: 1,
            ..RateLimits::default()
        };

        limiter
            .check_and_record(a, RateLimitDimension::DiscoveryRequestsPerMinute, &limits)
            .unwrap();
        assert!(
            limiter
                .check_and_record(b, RateLimitDimension::DiscoveryRequestsPerMinute, &limits)
                .is_ok()
        );
        assert!(
            limiter
                .check_and_record(a, RateLimitDimension::DiscoveryRequestsPerMinute, &limits)
                .is_err()
        );
    }
}
