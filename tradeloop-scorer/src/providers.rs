// SPDX-License-Identifier: Apache-2.0

//! External signal ports for market and historical data. Each method returns
//! `None` when the signal is unavailable; the scorer substitutes a neutral
//! default rather than failing. These are ports in the same sense as the
//! Cycle Engine's `CollectionResolver`: swappable, injected, with a default
//! no-op implementation for tenants that configure no external feed.

use tradeloop_common::{CollectionId, WalletId};

/// Market-derived signals, pre-normalized to `[0,1]` by the adapter so the
/// scorer never has to interpret a raw price feed.
pub trait MarketDataProvider: Send + Sync {
    fn floor_price_liquidity(&self, collection_id: &CollectionId) -> Option<f64>;
    fn volume_proxy(&self, collection_id: &CollectionId) -> Option<f64>;
    fn buyer_demand_proxy(&self, collection_id: &CollectionId) -> Option<f64>;
    /// 1.0 = historically stable (low risk), 0.0 = highly volatile.
    fn volatility_stability_proxy(&self, collection_id: &CollectionId) -> Option<f64>;
}

/// No external feed configured: every signal is neutral.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMarketDataProvider;

impl MarketDataProvider for NullMarketDataProvider {
    fn floor_price_liquidity(&self, _collection_id: &CollectionId) -> Option<f64> {
        None
    }

    fn volume_proxy(&self, _collection_id: &CollectionId) -> Option<f64> {
        None
    }

    fn buyer_demand_proxy(&self, _collection_id: &CollectionId) -> Option<f64> {
        None
    }

    fn volatility_stability_proxy(&self, _collection_id: &CollectionId) -> Option<f64> {
        None
    }
}

/// Prior-outcome signals (§4.3 "historical signals"): success rate of past
/// cycles that used this edge or this wallet.
pub trait HistoricalSignalProvider: Send + Sync {
    fn edge_success_rate(&self, from: &WalletId, to: &WalletId) -> Option<f64>;
    fn wallet_reliability(&self, wallet_id: &WalletId) -> Option<f64>;
    fn counterparty_familiarity(&self, a: &WalletId, b: &WalletId) -> Option<f64>;
}

/// No history recorded yet: every signal is neutral.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHistoricalSignalProvider;

impl HistoricalSignalProvider for NullHistoricalSignalProvider {
    fn edge_success_rate(&self, _from: &WalletId, _to: &WalletId) -> Option<f64> {
        None
    }

    fn wallet_reliability(&self, _wallet_id: &WalletId) -> Option<f64> {
        None
    }

    fn counterparty_familiarity(&self, _a: &WalletId, _b: &WalletId) -> Option<f64> {
        None
    }
}

pub const NEUTRAL_DEFAULT: f64 = 0.5;
