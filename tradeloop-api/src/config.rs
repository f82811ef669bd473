// SPDX-License-Identifier: Apache-2.0

//! §6 "Configuration (environment, enumerated)" plus the ambient logging and
//! metrics sections, deserialized the way `spo_api::config::Config` composes
//! its nested sub-configs.

use secrecy::SecretString;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tradeloop_common::telemetry::MetricsConfig;

fn default_bind_address() -> SocketAddr {
    ([0, 0, 0, 0], 8080).into()
}

fn default_max_cycle_depth() -> usize {
    10
}

fn default_min_efficiency() -> f64 {
    0.6
}

fn default_max_queue_depth() -> usize {
    256
}

fn default_request_body_limit_bytes() -> u64 {
    1024 * 1024
}

fn default_webhook_timeout_ms() -> u64 {
    3_000
}

fn default_webhook_max_attempts() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub admin_api_key: SecretString,

    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub enable_persistence: bool,

    #[serde(default = "default_max_cycle_depth")]
    pub max_cycle_depth: usize,

    #[serde(default = "default_min_efficiency")]
    pub min_efficiency: f64,

    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: usize,

    #[serde(default = "default_request_body_limit_bytes")]
    pub request_body_limit_bytes: u64,

    #[serde(default = "default_webhook_timeout_ms")]
    pub webhook_timeout_ms: u64,

    #[serde(default = "default_webhook_max_attempts")]
    pub webhook_max_attempts: u32,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ServerConfig {
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.webhook_timeout_ms)
    }
}
