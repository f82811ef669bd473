// SPDX-License-Identifier: Apache-2.0

//! §4.3 Scorer: the 18-metric fairness score that ranks discovered cycles.

mod metrics;
mod providers;
mod score;
mod weights;

pub use metrics::Metrics;
pub use providers::{
    HistoricalSignalProvider, MarketDataProvider, NullHistoricalSignalProvider,
    NullMarketDataProvider, NEUTRAL_DEFAULT,
};
pub use score::{score_cycle, Score};
pub use weights::ALL_WEIGHTS;
