// SPDX-License-Identifier: Apache-2.0

//! §4.4 Cycle Cache: one write lock per tenant, same shape as
//! `tradeloop-graph::TenantGraph` — a private, unlocked `Cache` doing the
//! real work, wrapped in a public handle that takes the lock once per call.

use crate::entry::{CacheEntry, CycleState};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tradeloop_common::{AssetId, CanonicalCycleId, WalletId};
use tradeloop_engine::Cycle;
use tradeloop_scorer::Score;

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub max_memory_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50_000,
            max_memory_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default)]
struct Cache {
    entries: BTreeMap<CanonicalCycleId, CacheEntry>,
    by_wallet: BTreeMap<WalletId, BTreeSet<CanonicalCycleId>>,
    by_asset: BTreeMap<AssetId, BTreeSet<CanonicalCycleId>>,
    current_memory_bytes: usize,
}

impl Cache {
    fn index_insert(&mut self, id: &CanonicalCycleId, cycle: &Cycle) {
        for wallet_id in &cycle.wallets {
            self.by_wallet.entry(wallet_id.clone()).or_default().insert(id.clone());
        }
        for step in &cycle.steps {
            for asset_id in &step.nfts {
                self.by_asset.entry(asset_id.clone()).or_default().insert(id.clone());
            }
        }
    }

    fn index_remove(&mut self, id: &CanonicalCycleId, cycle: &Cycle) {
        for wallet_id in &cycle.wallets {
            if let Some(set) = self.by_wallet.get_mut(wallet_id) {
                set.remove(id);
                if set.is_empty() {
                    self.by_wallet.remove(wallet_id);
                }
            }
        }
        for step in &cycle.steps {
            for asset_id in &step.nfts {
                if let Some(set) = self.by_asset.get_mut(asset_id) {
                    set.remove(id);
                    if set.is_empty() {
                        self.by_asset.remove(asset_id);
                    }
                }
            }
        }
    }

    fn upsert(&mut self, cycle: Cycle, score: Score, config: &CacheConfig) {
        let now = Instant::now();

        if let Some(existing) = self.entries.get_mut(&cycle.id) {
            self.current_memory_bytes -= existing.approx_size_bytes();
            existing.score = score;
            existing.state = CycleState::Admitted;
            existing.last_verified = now;
            existing.last_accessed = now;
            self.current_memory_bytes += existing.approx_size_bytes();
            return;
        }

        let id = cycle.id.clone();
        self.index_insert(&id, &cycle);
        let entry = CacheEntry {
            cycle,
            score,
            state: CycleState::Admitted,
            first_seen: now,
            last_verified: now,
            last_accessed: now,
        };
        self.current_memory_bytes += entry.approx_size_bytes();
        self.entries.insert(id, entry);

        self.evict_if_needed(config);
    }

    fn retire_matching(&mut self, ids: &BTreeSet<CanonicalCycleId>) {
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.state = CycleState::Retired;
            }
        }
    }

    fn invalidate_asset(&mut self, asset_id: &AssetId) {
        if let Some(ids) = self.by_asset.get(asset_id).cloned() {
            self.retire_matching(&ids);
        }
    }

    fn invalidate_wallet(&mut self, wallet_id: &WalletId) {
        if let Some(ids) = self.by_wallet.get(wallet_id).cloned() {
            self.retire_matching(&ids);
        }
    }

    fn query_by_wallet(&mut self, wallet_id: &WalletId, limit: usize, min_score: f64) -> Vec<(Cycle, Score)> {
        let Some(ids) = self.by_wallet.get(wallet_id).cloned() else {
            return Vec::new();
        };

        let mut candidates: Vec<CanonicalCycleId> = ids
            .into_iter()
            .filter(|id| {
                self.entries.get(id).is_some_and(|e| {
                    e.state == CycleState::Admitted && e.score.quality_score >= min_score
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            let ea = &self.entries[a];
            let eb = &self.entries[b];
            eb.score
                .quality_score
                .partial_cmp(&ea.score.quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| eb.score.efficiency.partial_cmp(&ea.score.efficiency).unwrap_or(std::cmp::Ordering::Equal))
        });
        candidates.truncate(limit);

        let now = Instant::now();
        candidates
            .into_iter()
            .map(|id| {
                let entry = self.entries.get_mut(&id).expect("filtered above");
                entry.last_accessed = now;
                (entry.cycle.clone(), entry.score.clone())
            })
            .collect()
    }

    /// Retired entries are evicted before any Admitted one; within a tier,
    /// least-recently-accessed goes first.
    fn evict_if_needed(&mut self, config: &CacheConfig) {
        while self.entries.len() > config.max_entries || self.current_memory_bytes > config.max_memory_bytes {
            let Some(victim) = self.pick_eviction_victim() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&victim) {
                self.current_memory_bytes -= entry.approx_size_bytes();
                self.index_remove(&victim, &entry.cycle);
            }
        }
    }

    fn pick_eviction_victim(&self) -> Option<CanonicalCycleId> {
        self.entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                let tier = |e: &CacheEntry| matches!(e.state, CycleState::Retired).then_some(0).unwrap_or(1);
                tier(a).cmp(&tier(b)).then_with(|| a.last_accessed.cmp(&b.last_accessed))
            })
            .map(|(id, _)| id.clone())
    }
}

/// The lock-protected per-tenant handle, the cache counterpart of
/// `tradeloop_graph::TenantGraph`.
pub struct TenantCycleCache {
    inner: RwLock<Cache>,
    config: CacheConfig,
}

impl TenantCycleCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Cache::default()),
            config,
        }
    }

    pub fn upsert(&self, cycle: Cycle, score: Score) {
        self.inner.write().upsert(cycle, score, &self.config);
    }

    pub fn invalidate_asset(&self, asset_id: &AssetId) {
        self.inner.write().invalidate_asset(asset_id);
    }

    pub fn invalidate_wallet(&self, wallet_id: &WalletId) {
        self.inner.write().invalidate_wallet(wallet_id);
    }

    pub fn query_by_wallet(&self, wallet_id: &WalletId, limit: usize, min_score: f64) -> Vec<(Cycle, Score)> {
        self.inner.write().query_by_wallet(wallet_id, limit, min_score)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TenantCycleCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeloop_common::CanonicalCycleId;
    use tradeloop_engine::CycleStep;
    use tradeloop_scorer::Metrics;

    fn metrics(v: f64) -> Metrics {
        Metrics {
            value_variance: v,
            value_ratio: v,
            fairness_balance: v,
            value_completeness: v,
            length_penalty: v,
            participant_diversity: v,
            step_balance: v,
            cycle_density: v,
            floor_price_liquidity: v,
            volume_proxy: v,
            buyer_demand_proxy: v,
            volatility_risk: v,
            counterparty_familiarity: v,
            execution_risk: v,
            concentration_risk: v,
            edge_success_rate: v,
            wallet_reliability: v,
            cohort_trust_floor: v,
        }
    }

    fn score(quality: f64, efficiency: f64) -> Score {
        Score {
            metrics: metrics(quality),
            quality_score: quality,
            efficiency,
        }
    }

    fn cycle(id: &str, wallets: &[&str]) -> Cycle {
        let wallet_ids: Vec<_> = wallets.iter().map(|w| WalletId::from(*w)).collect();
        let k = wallet_ids.len();
        let steps = (0..k)
            .map(|i| CycleStep {
                from: wallet_ids[i].clone(),
                to: wallet_ids[(i + 1) % k].clone(),
                nfts: vec![AssetId::from(format!("{id}-nft-{i}").as_str())],
            })
            .collect();
        Cycle {
            id: CanonicalCycleId::new(id),
            wallets: wallet_ids,
            steps,
        }
    }

    #[test]
    fn upsert_is_queryable_by_every_participating_wallet() {
        let cache = TenantCycleCache::default();
        cache.upsert(cycle("c1", &["A", "B"]), score(0.8, 0.9));

        assert_eq!(cache.query_by_wallet(&WalletId::from("A"), 10, 0.0).len(), 1);
        assert_eq!(cache.query_by_wallet(&WalletId::from("B"), 10, 0.0).len(), 1);
    }

    #[test]
    fn invalidating_an_asset_retires_every_cycle_witnessing_it() {
        let cache = TenantCycleCache::default();
        cache.upsert(cycle("c1", &["A", "B"]), score(0.8, 0.9));

        cache.invalidate_asset(&AssetId::from("c1-nft-0"));

        assert!(cache.query_by_wallet(&WalletId::from("A"), 10, 0.0).is_empty());
    }

    #[test]
    fn query_orders_by_quality_then_efficiency() {
        let cache = TenantCycleCache::default();
        cache.upsert(cycle("low", &["A", "B"]), score(0.5, 0.9));
        cache.upsert(cycle("high", &["A", "C"]), score(0.9, 0.1));

        let results = cache.query_by_wallet(&WalletId::from("A"), 10, 0.0);
        assert_eq!(results[0].0.id, CanonicalCycleId::new("high"));
        assert_eq!(results[1].0.id, CanonicalCycleId::new("low"));
    }

    #[test]
    fn min_score_filters_out_low_quality_cycles() {
        let cache = TenantCycleCache::default();
        cache.upsert(cycle("c1", &["A", "B"]), score(0.3, 0.9));

        assert!(cache.query_by_wallet(&WalletId::from("A"), 10, 0.5).is_empty());
    }

    #[test]
    fn eviction_prefers_retired_entries_over_admitted_ones() {
        let cache = TenantCycleCache::new(CacheConfig {
            max_entries: 1,
            max_memory_bytes: usize::MAX,
        });
        cache.upsert(cycle("c1", &["A", "B"]), score(0.8, 0.9));
        cache.invalidate_wallet(&WalletId::from("A"));

        cache.upsert(cycle("c2", &["C", "D"]), score(0.8, 0.9));

        assert_eq!(cache.len(), 1);
        assert!(cache.query_by_wallet(&WalletId::from("C"), 10, 0.0).len() == 1);
    }
}
