// SPDX-License-Identifier: Apache-2.0

//! §3 Score: 18 named metrics plus the weighted `qualityScore` and the
//! `efficiency` composite.

use crate::metrics::{self, Metrics};
use crate::providers::{HistoricalSignalProvider, MarketDataProvider};
use crate::weights::{ALL_WEIGHTS, EFFICIENCY_WEIGHTS};
use serde::Serialize;
use tradeloop_engine::Cycle;
use tradeloop_graph::GraphSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct Score {
    pub metrics: Metrics,
    pub quality_score: f64,
    pub efficiency: f64,
}

/// Scores a single cycle against a graph snapshot and the tenant's external
/// data ports. Pure and deterministic: the same cycle, snapshot, and provider
/// answers always produce the same `Score` (§4.3 "Determinism").
pub fn score_cycle(
    cycle: &Cycle,
    snapshot: &GraphSnapshot,
    market: &dyn MarketDataProvider,
    historical: &dyn HistoricalSignalProvider,
) -> Score {
    let metrics = Metrics {
        value_variance: metrics::value_variance(cycle, snapshot),
        value_ratio: metrics::value_ratio(cycle, snapshot),
        fairness_balance: metrics::fairness_balance(cycle, snapshot),
        value_completeness: metrics::value_completeness(cycle, snapshot),
        length_penalty: metrics::length_penalty(cycle),
        participant_diversity: metrics::participant_diversity(cycle, snapshot),
        step_balance: metrics::step_balance(cycle),
        cycle_density: metrics::cycle_density(cycle),
        floor_price_liquidity: metrics::floor_price_liquidity(cycle, snapshot, market),
        volume_proxy: metrics::volume_proxy(cycle, snapshot, market),
        buyer_demand_proxy: metrics::buyer_demand_proxy(cycle, snapshot, market),
        volatility_risk: metrics::volatility_risk(cycle, snapshot, market),
        counterparty_familiarity: metrics::counterparty_familiarity(cycle, historical),
        execution_risk: metrics::execution_risk(cycle),
        concentration_risk: metrics::concentration_risk(cycle, snapshot),
        edge_success_rate: metrics::edge_success_rate(cycle, historical),
        wallet_reliability: metrics::wallet_reliability(cycle, historical),
        cohort_trust_floor: metrics::cohort_trust_floor(cycle, historical),
    };

    let quality_score = weighted_sum(&metrics.as_array(), &ALL_WEIGHTS);
    let efficiency = weighted_average(&metrics.efficiency_subset(), &EFFICIENCY_WEIGHTS);

    Score {
        metrics,
        quality_score,
        efficiency,
    }
}

fn weighted_sum(values: &[f64], weights: &[f64]) -> f64 {
    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>().clamp(0.0, 1.0)
}

fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total_weight: f64 = weights.iter().sum();
    (weighted_sum(values, weights) * (1.0 / total_weight)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{NullHistoricalSignalProvider, NullMarketDataProvider};
    use tradeloop_engine::CycleStep;
    use tradeloop_graph::{Asset, Metadata, Valuation};
    use tradeloop_common::{AssetId, CanonicalCycleId, WalletId};

    fn asset(id: &str, owner: &str, amount: f64) -> Asset {
        Asset {
            id: AssetId::from(id),
            metadata: Metadata {
                name: id.to_owned(),
                symbol: id.to_owned(),
                image: None,
                collection_id: None,
            },
            owner: WalletId::from(owner),
            valuation: Some(Valuation {
                amount,
                currency: "USD".to_owned(),
            }),
        }
    }

    fn two_cycle_snapshot() -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        snapshot.assets.insert(AssetId::from("X"), asset("X", "B", 100.0));
        snapshot.assets.insert(AssetId::from("Y"), asset("Y", "A", 100.0));
        snapshot
    }

    fn two_cycle() -> Cycle {
        Cycle {
            id: CanonicalCycleId::new("A>B|Y,X"),
            wallets: vec![WalletId::from("A"), WalletId::from("B")],
            steps: vec![
                CycleStep {
                    from: WalletId::from("A"),
                    to: WalletId::from("B"),
                    nfts: vec![AssetId::from("Y")],
                },
                CycleStep {
                    from: WalletId::from("B"),
                    to: WalletId::from("A"),
                    nfts: vec![AssetId::from("X")],
                },
            ],
        }
    }

    #[test]
    fn equal_value_two_cycle_scores_high_efficiency() {
        let snapshot = two_cycle_snapshot();
        let cycle = two_cycle();
        let score = score_cycle(&cycle, &snapshot, &NullMarketDataProvider, &NullHistoricalSignalProvider);

        assert!(score.efficiency >= 0.9, "efficiency was {}", score.efficiency);
        assert!(score.quality_score > 0.0 && score.quality_score <= 1.0);
    }

    #[test]
    fn missing_valuations_fall_back_to_neutral_without_erroring() {
        let snapshot = GraphSnapshot::default();
        let cycle = two_cycle();
        let score = score_cycle(&cycle, &snapshot, &NullMarketDataProvider, &NullHistoricalSignalProvider);

        assert!(score.quality_score > 0.0);
    }

    #[test]
    fn balanced_two_cycle_with_no_valuations_still_clears_the_efficiency_floor() {
        // no asset in the snapshot carries a valuation: a tenant with no
        // pricing feed configured shouldn't have every cycle penalized for it.
        let snapshot = GraphSnapshot::default();
        let cycle = two_cycle();
        let score = score_cycle(&cycle, &snapshot, &NullMarketDataProvider, &NullHistoricalSignalProvider);

        assert!(score.efficiency >= 0.9, "efficiency was {}", score.efficiency);
    }
}
