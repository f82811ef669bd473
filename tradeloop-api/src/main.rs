// SPDX-License-Identifier: Apache-2.0

//! Binary entry point. Exit codes: `0` clean shutdown, `1` configuration
//! error, `2` bind/serve failure — mirroring `spo_api::main`'s convention of
//! a distinct code per failure class so process supervisors can tell them
//! apart.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tradeloop_api::config::ServerConfig;
use tradeloop_common::config::ConfigExt;
use tradeloop_common::telemetry::{init_logging, init_metrics};

#[derive(Parser, Debug)]
#[command(name = "tradeloop-server", about = "Multi-tenant NFT barter trade-discovery engine")]
struct Cli {
    /// Path to a TOML config file; environment variables under TRADELOOP_
    /// override whatever it sets.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServerConfig::load(path),
        None => ServerConfig::load_from_env(),
    };

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::from(1);
        }
    };

    init_metrics(config.metrics.clone());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start tokio runtime");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(tradeloop_api::application::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server exited with an error");
            ExitCode::from(2)
        }
    }
}
