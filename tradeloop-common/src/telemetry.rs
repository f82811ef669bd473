// SPDX-License-Identifier: Apache-2.0

//! Logging and metrics bootstrap, called once from each binary's `main`, mirroring
//! `spo_api::main`'s `telemetry::init_logging()` + panic-hook pattern.

use serde::Deserialize;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub metrics_config: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_address: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: ([127, 0, 0, 1], 9000).into(),
        }
    }
}

/// Installs a `tracing-subscriber` registry with an env-filter
/// (`RUST_LOG=tradeloop=debug,info` style) and a compact stderr formatter.
/// Idempotent: tests that call it more than once within a process just ignore
/// the second `try_init` failure.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Installs a Prometheus exporter serving `/metrics` on `listen_address` when
/// enabled. A no-op otherwise so services without Prometheus scraping configured
/// don't pay for the listener.
pub fn init_metrics(config: MetricsConfig) {
    if !config.enabled {
        return;
    }

    if let Err(error) = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(config.listen_address)
        .install()
    {
        tracing::warn!(error = %error, "failed to install Prometheus exporter");
    }
}
