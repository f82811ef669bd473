// SPDX-License-Identifier: Apache-2.0

//! Configuration loading: a TOML file (the `--config <path>` CLI argument) layered
//! under environment variable overrides, building a `Config` via `figment` before
//! calling `serde::Deserialize`. Nested fields are addressed with a `__`
//! separator, e.g. `TRADELOOP_RATE_LIMIT__DISCOVERY_PER_MINUTE`.

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

const ENV_PREFIX: &str = "TRADELOOP_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load configuration")]
    Load(#[from] figment::Error),
}

/// Implemented by every crate's `Config` struct so `Config::load(path)` reads
/// the same way everywhere (`Config::load().context("load configuration")` in
/// `main`).
pub trait ConfigExt: DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Loads from environment variables only, useful for tests and for
    /// `ENABLE_PERSISTENCE`/`ADMIN_API_KEY`-style top-level settings that have no
    /// natural place in a per-tenant file.
    fn load_from_env() -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
    }
}

impl<T: DeserializeOwned> ConfigExt for T {}
