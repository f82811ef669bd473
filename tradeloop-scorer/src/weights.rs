// SPDX-License-Identifier: Apache-2.0

//! The frozen weight vector (§4.3, §9 Open Question: "exact weights ... the
//! implementer must freeze a weight vector and document it"). Eighteen
//! weights, one per metric in `Metrics`, grouped and summing to exactly 1.0.
//! A unit test below pins that invariant.

/// Value alignment: how evenly the traded value is distributed across the
/// cycle. Weighted highest — this is the metric group closest to "fairness"
/// in the everyday sense the rest of the system is named for.
pub const W_VALUE_VARIANCE: f64 = 0.10;
pub const W_VALUE_RATIO: f64 = 0.08;
pub const W_FAIRNESS_BALANCE: f64 = 0.06;
pub const W_VALUE_COMPLETENESS: f64 = 0.04;

/// Path properties: shape of the cycle itself, independent of asset value.
pub const W_LENGTH_PENALTY: f64 = 0.09;
pub const W_PARTICIPANT_DIVERSITY: f64 = 0.06;
pub const W_STEP_BALANCE: f64 = 0.04;
pub const W_CYCLE_DENSITY: f64 = 0.03;

/// Market: liquidity and demand proxies for the collections involved.
pub const W_FLOOR_PRICE_LIQUIDITY: f64 = 0.07;
pub const W_VOLUME_PROXY: f64 = 0.05;
pub const W_BUYER_DEMAND_PROXY: f64 = 0.04;

/// Risk: likelihood the trade fails to settle or one leg is mispriced.
pub const W_VOLATILITY_RISK: f64 = 0.06;
pub const W_COUNTERPARTY_FAMILIARITY: f64 = 0.05;
pub const W_EXECUTION_RISK: f64 = 0.05;
pub const W_CONCENTRATION_RISK: f64 = 0.04;

/// Historical: outcomes of prior cycles touching these wallets/edges.
pub const W_EDGE_SUCCESS_RATE: f64 = 0.06;
pub const W_WALLET_RELIABILITY: f64 = 0.05;
pub const W_COHORT_TRUST_FLOOR: f64 = 0.03;

/// Metrics folded into the `efficiency` composite (§4.3: "a composite of
/// value-alignment and path-length metrics"), re-normalized against each
/// other since `qualityScore`'s weights aren't meant to sum to 1 over this
/// subset alone.
pub const EFFICIENCY_WEIGHTS: [f64; 8] = [
    W_VALUE_VARIANCE,
    W_VALUE_RATIO,
    W_FAIRNESS_BALANCE,
    W_VALUE_COMPLETENESS,
    W_LENGTH_PENALTY,
    W_PARTICIPANT_DIVERSITY,
    W_STEP_BALANCE,
    W_CYCLE_DENSITY,
];

pub const ALL_WEIGHTS: [f64; 18] = [
    W_VALUE_VARIANCE,
    W_VALUE_RATIO,
    W_FAIRNESS_BALANCE,
    W_VALUE_COMPLETENESS,
    W_LENGTH_PENALTY,
    W_PARTICIPANT_DIVERSITY,
    W_STEP_BALANCE,
    W_CYCLE_DENSITY,
    W_FLOOR_PRICE_LIQUIDITY,
    W_VOLUME_PROXY,
    W_BUYER_DEMAND_PROXY,
    W_VOLATILITY_RISK,
    W_COUNTERPARTY_FAMILIARITY,
    W_EXECUTION_RISK,
    W_CONCENTRATION_RISK,
    W_EDGE_SUCCESS_RATE,
    W_WALLET_RELIABILITY,
    W_COHORT_TRUST_FLOOR,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_weights_sum_to_one() {
        let sum: f64 = ALL_WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "weights summed to {sum}");
    }
}
