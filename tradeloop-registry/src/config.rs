// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use tradeloop_identity::RateLimits;

fn default_max_cycle_length() -> usize {
    10
}

fn default_min_efficiency() -> f64 {
    0.6
}

fn default_max_cycles_per_request() -> usize {
    100
}

fn default_max_assets_per_wallet() -> usize {
    10_000
}

fn default_max_wants_per_wallet() -> usize {
    10_000
}

/// Per-tenant algorithm config, security caps, and rate limits (§3 Tenant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    #[serde(default = "default_max_cycle_length")]
    pub max_cycle_length: usize,

    #[serde(default = "default_min_efficiency")]
    pub min_efficiency: f64,

    #[serde(default = "default_max_cycles_per_request")]
    pub max_cycles_per_request: usize,

    #[serde(default = "default_max_assets_per_wallet")]
    pub max_assets_per_wallet: usize,

    #[serde(default = "default_max_wants_per_wallet")]
    pub max_wants_per_wallet: usize,

    #[serde(default)]
    pub bundle_detection_enabled: bool,

    #[serde(default)]
    pub rate_limits: RateLimits,

    /// Webhook target for `trade_discovered` notifications (§4.6); absent disables delivery.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            max_cycle_length: default_max_cycle_length(),
            min_efficiency: default_min_efficiency(),
            max_cycles_per_request: default_max_cycles_per_request(),
            max_assets_per_wallet: default_max_assets_per_wallet(),
            max_wants_per_wallet: default_max_wants_per_wallet(),
            bundle_detection_enabled: false,
            rate_limits: RateLimits::default(),
            webhook_url: None,
        }
    }
}
