// SPDX-License-Identifier: Apache-2.0

//! The 18 metric computations feeding the overall quality score. Every
//! function is pure: same `Cycle` + same snapshot + same provider answers
//! always produce the same metric.
//!
//! The value-alignment metrics treat a cycle with zero recorded valuations
//! (no tenant-side valuation feed at all) as having nothing to flag: there is
//! no evidence the trade is uneven, so variance/ratio/fairness default to
//! their best score rather than a neutral one. `value_completeness` is the
//! exception — it measures the presence of valuation data itself, so it
//! stays at the neutral default instead of claiming completeness it doesn't
//! have. A cycle with *some* but not all legs valued keeps the neutral
//! default throughout, since partial data is genuinely ambiguous rather than
//! absent.

use crate::providers::{HistoricalSignalProvider, MarketDataProvider, NEUTRAL_DEFAULT};
use serde::Serialize;
use tradeloop_engine::Cycle;
use tradeloop_graph::GraphSnapshot;

const IDEAL_CYCLE_LENGTH: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Metrics {
    // Value alignment
    pub value_variance: f64,
    pub value_ratio: f64,
    pub fairness_balance: f64,
    pub value_completeness: f64,
    // Path properties
    pub length_penalty: f64,
    pub participant_diversity: f64,
    pub step_balance: f64,
    pub cycle_density: f64,
    // Market
    pub floor_price_liquidity: f64,
    pub volume_proxy: f64,
    pub buyer_demand_proxy: f64,
    // Risk
    pub volatility_risk: f64,
    pub counterparty_familiarity: f64,
    pub execution_risk: f64,
    pub concentration_risk: f64,
    // Historical
    pub edge_success_rate: f64,
    pub wallet_reliability: f64,
    pub cohort_trust_floor: f64,
}

impl Metrics {
    /// The 18 values in the same order as `weights::ALL_WEIGHTS`.
    pub fn as_array(&self) -> [f64; 18] {
        [
            self.value_variance,
            self.value_ratio,
            self.fairness_balance,
            self.value_completeness,
            self.length_penalty,
            self.participant_diversity,
            self.step_balance,
            self.cycle_density,
            self.floor_price_liquidity,
            self.volume_proxy,
            self.buyer_demand_proxy,
            self.volatility_risk,
            self.counterparty_familiarity,
            self.execution_risk,
            self.concentration_risk,
            self.edge_success_rate,
            self.wallet_reliability,
            self.cohort_trust_floor,
        ]
    }

    /// The 8 metrics `EFFICIENCY_WEIGHTS` is ordered against.
    pub fn efficiency_subset(&self) -> [f64; 8] {
        [
            self.value_variance,
            self.value_ratio,
            self.fairness_balance,
            self.value_completeness,
            self.length_penalty,
            self.participant_diversity,
            self.step_balance,
            self.cycle_density,
        ]
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn coefficient_of_variation_score(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        // no valuation data anywhere to measure a spread against
        return 1.0;
    }
    if xs.len() < 2 {
        return NEUTRAL_DEFAULT;
    }
    let m = mean(xs);
    if m <= 0.0 {
        return NEUTRAL_DEFAULT;
    }
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    let cv = variance.sqrt() / m;
    clamp01(1.0 / (1.0 + cv))
}

/// Per-step asset valuations, in step order, for steps whose chosen asset has
/// a recorded valuation.
fn step_valuations(cycle: &Cycle, snapshot: &GraphSnapshot) -> Vec<f64> {
    cycle
        .steps
        .iter()
        .filter_map(|step| step.nfts.first())
        .filter_map(|asset_id| snapshot.assets.get(asset_id))
        .filter_map(|asset| asset.valuation.as_ref())
        .map(|v| v.amount)
        .collect()
}

pub fn value_variance(cycle: &Cycle, snapshot: &GraphSnapshot) -> f64 {
    coefficient_of_variation_score(&step_valuations(cycle, snapshot))
}

pub fn value_ratio(cycle: &Cycle, snapshot: &GraphSnapshot) -> f64 {
    let values = step_valuations(cycle, snapshot);
    if values.is_empty() {
        // no valuation data anywhere to measure a ratio against
        return 1.0;
    }
    if values.len() < 2 {
        return NEUTRAL_DEFAULT;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max <= 0.0 {
        return NEUTRAL_DEFAULT;
    }
    clamp01(min / max)
}

/// Net value each wallet receives minus what it gives, relative to the
/// average trade size; a fair cycle keeps this close to zero for everyone.
pub fn fairness_balance(cycle: &Cycle, snapshot: &GraphSnapshot) -> f64 {
    let k = cycle.steps.len();
    if k < 2 {
        return NEUTRAL_DEFAULT;
    }

    let step_values: Vec<Option<f64>> = cycle
        .steps
        .iter()
        .map(|step| {
            step.nfts
                .first()
                .and_then(|asset_id| snapshot.assets.get(asset_id))
                .and_then(|asset| asset.valuation.as_ref())
                .map(|v| v.amount)
        })
        .collect();

    if step_values.iter().all(Option::is_none) {
        // no valuation data anywhere to measure an imbalance against
        return 1.0;
    }
    if step_values.iter().any(Option::is_none) {
        return NEUTRAL_DEFAULT;
    }

    let given: Vec<f64> = step_values.iter().map(|v| v.unwrap()).collect();
    let mean_given = mean(&given);
    if mean_given <= 0.0 {
        return NEUTRAL_DEFAULT;
    }

    // wallet i gives step[i]'s asset and receives step[i-1]'s asset
    let mean_abs_balance = mean(
        &(0..k)
            .map(|i| (given[(i + k - 1) % k] - given[i]).abs())
            .collect::<Vec<_>>(),
    );

    clamp01(1.0 - mean_abs_balance / mean_given)
}

pub fn value_completeness(cycle: &Cycle, snapshot: &GraphSnapshot) -> f64 {
    if cycle.steps.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    let present = cycle
        .steps
        .iter()
        .filter_map(|step| step.nfts.first())
        .filter_map(|asset_id| snapshot.assets.get(asset_id))
        .filter(|asset| asset.valuation.is_some())
        .count();
    if present == 0 {
        // distinct from "some missing": no valuation feed configured at all,
        // neither complete nor incomplete
        return NEUTRAL_DEFAULT;
    }
    clamp01(present as f64 / cycle.steps.len() as f64)
}

pub fn length_penalty(cycle: &Cycle) -> f64 {
    let len = cycle.total_participants() as f64;
    clamp01(1.0 / (1.0 + (len - IDEAL_CYCLE_LENGTH).abs() * 0.15))
}

pub fn participant_diversity(cycle: &Cycle, snapshot: &GraphSnapshot) -> f64 {
    let asset_ids: Vec<_> = cycle.steps.iter().flat_map(|s| s.nfts.iter()).collect();
    if asset_ids.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    let distinct_collections: std::collections::BTreeSet<_> = asset_ids
        .iter()
        .filter_map(|id| snapshot.assets.get(*id))
        .filter_map(|a| a.metadata.collection_id.as_ref())
        .collect();
    if distinct_collections.is_empty() {
        // No collection metadata to measure redundancy against; nothing
        // observed counts against diversity.
        return 1.0;
    }
    clamp01(distinct_collections.len() as f64 / asset_ids.len() as f64)
}

pub fn step_balance(cycle: &Cycle) -> f64 {
    let counts: Vec<f64> = cycle.steps.iter().map(|s| s.nfts.len() as f64).collect();
    if counts.len() < 2 {
        return 1.0;
    }
    coefficient_of_variation_score(&counts)
}

pub fn cycle_density(cycle: &Cycle) -> f64 {
    let total_nfts: usize = cycle.steps.iter().map(|s| s.nfts.len()).sum();
    if total_nfts == 0 {
        return NEUTRAL_DEFAULT;
    }
    let unique: std::collections::BTreeSet<_> =
        cycle.steps.iter().flat_map(|s| s.nfts.iter()).collect();
    clamp01(unique.len() as f64 / total_nfts as f64)
}

fn collection_ids_in_cycle(
    cycle: &Cycle,
    snapshot: &GraphSnapshot,
) -> std::collections::BTreeSet<tradeloop_common::CollectionId> {
    cycle
        .steps
        .iter()
        .flat_map(|s| s.nfts.iter())
        .filter_map(|id| snapshot.assets.get(id))
        .filter_map(|a| a.metadata.collection_id.clone())
        .collect()
}

fn average_market_signal(
    cycle: &Cycle,
    snapshot: &GraphSnapshot,
    provider: &dyn MarketDataProvider,
    f: impl Fn(&dyn MarketDataProvider, &tradeloop_common::CollectionId) -> Option<f64>,
) -> f64 {
    let collections = collection_ids_in_cycle(cycle, snapshot);
    if collections.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    let values: Vec<f64> = collections
        .iter()
        .map(|c| f(provider, c).unwrap_or(NEUTRAL_DEFAULT))
        .collect();
    clamp01(mean(&values))
}

pub fn floor_price_liquidity(cycle: &Cycle, snapshot: &GraphSnapshot, provider: &dyn MarketDataProvider) -> f64 {
    average_market_signal(cycle, snapshot, provider, |p, c| p.floor_price_liquidity(c))
}

pub fn volume_proxy(cycle: &Cycle, snapshot: &GraphSnapshot, provider: &dyn MarketDataProvider) -> f64 {
    average_market_signal(cycle, snapshot, provider, |p, c| p.volume_proxy(c))
}

pub fn buyer_demand_proxy(cycle: &Cycle, snapshot: &GraphSnapshot, provider: &dyn MarketDataProvider) -> f64 {
    average_market_signal(cycle, snapshot, provider, |p, c| p.buyer_demand_proxy(c))
}

pub fn volatility_risk(cycle: &Cycle, snapshot: &GraphSnapshot, provider: &dyn MarketDataProvider) -> f64 {
    average_market_signal(cycle, snapshot, provider, |p, c| p.volatility_stability_proxy(c))
}

pub fn counterparty_familiarity(cycle: &Cycle, provider: &dyn HistoricalSignalProvider) -> f64 {
    if cycle.steps.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    let values: Vec<f64> = cycle
        .steps
        .iter()
        .map(|s| provider.counterparty_familiarity(&s.from, &s.to).unwrap_or(NEUTRAL_DEFAULT))
        .collect();
    clamp01(mean(&values))
}

pub fn execution_risk(cycle: &Cycle) -> f64 {
    let len = cycle.total_participants() as f64;
    clamp01(1.0 - ((len - 2.0).max(0.0) * 0.08))
}

/// Herfindahl-style concentration of traded value across participants; lower
/// concentration (more even spread) scores higher.
pub fn concentration_risk(cycle: &Cycle, snapshot: &GraphSnapshot) -> f64 {
    let values = step_valuations(cycle, snapshot);
    if values.len() < 2 {
        return NEUTRAL_DEFAULT;
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return NEUTRAL_DEFAULT;
    }
    let hhi: f64 = values.iter().map(|v| (v / total).powi(2)).sum();
    let n = values.len() as f64;
    let min_hhi = 1.0 / n;
    // hhi ranges [min_hhi, 1.0]; invert and rescale so perfectly even spread scores 1.0
    clamp01(1.0 - (hhi - min_hhi) / (1.0 - min_hhi))
}

pub fn edge_success_rate(cycle: &Cycle, provider: &dyn HistoricalSignalProvider) -> f64 {
    if cycle.steps.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    let values: Vec<f64> = cycle
        .steps
        .iter()
        .map(|s| provider.edge_success_rate(&s.from, &s.to).unwrap_or(NEUTRAL_DEFAULT))
        .collect();
    clamp01(mean(&values))
}

pub fn wallet_reliability(cycle: &Cycle, provider: &dyn HistoricalSignalProvider) -> f64 {
    if cycle.wallets.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    let values: Vec<f64> = cycle
        .wallets
        .iter()
        .map(|w| provider.wallet_reliability(w).unwrap_or(NEUTRAL_DEFAULT))
        .collect();
    clamp01(mean(&values))
}

pub fn cohort_trust_floor(cycle: &Cycle, provider: &dyn HistoricalSignalProvider) -> f64 {
    if cycle.wallets.is_empty() {
        return NEUTRAL_DEFAULT;
    }
    cycle
        .wallets
        .iter()
        .map(|w| provider.wallet_reliability(w).unwrap_or(NEUTRAL_DEFAULT))
        .fold(f64::INFINITY, f64::min)
        .clamp(0.0, 1.0)
}
