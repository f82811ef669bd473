// SPDX-License-Identifier: Apache-2.0

//! §4.1 Persistent Graph: the per-tenant in-memory graph of wallets, assets,
//! and wants, plus the derived directed wants-edges. Every public mutation is
//! a single critical section that keeps assets, wants, and edges consistent
//! (§3 Graph invariant), returning the dirty set of wallets whose incident
//! edges changed.

use crate::asset::{Asset, AssetSubmission};
use crate::wallet::{WalletState, WantTarget};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tradeloop_common::{ApiError, AssetId, WalletId};

pub type DirtySet = BTreeSet<WalletId>;

/// An immutable, value-copied view of the graph, safe to enumerate without
/// holding any lock (§4.1 `snapshot()`, §5 "cycle enumeration runs under a
/// read snapshot of the graph to permit concurrent queries").
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub wallets: BTreeMap<WalletId, WalletState>,
    pub assets: BTreeMap<AssetId, Asset>,
    /// `edges[u][v]` is the set of assets witnessing the edge `u -> v`: `u`
    /// wants each of them and `v` owns it.
    pub edges: BTreeMap<WalletId, BTreeMap<WalletId, BTreeSet<AssetId>>>,
}

impl GraphSnapshot {
    pub fn neighbors(&self, wallet_id: &WalletId) -> impl Iterator<Item = (&WalletId, &BTreeSet<AssetId>)> {
        self.edges
            .get(wallet_id)
            .into_iter()
            .flat_map(|targets| targets.iter())
    }

    pub fn wallet_ids(&self) -> impl Iterator<Item = &WalletId> {
        self.wallets.keys()
    }
}

#[derive(Debug, Default)]
struct Graph {
    wallets: BTreeMap<WalletId, WalletState>,
    assets: BTreeMap<AssetId, Asset>,
    /// Inverted index: asset -> wallets with an explicit `WantTarget::Asset` on it.
    asset_wanters: BTreeMap<AssetId, BTreeSet<WalletId>>,
    edges: BTreeMap<WalletId, BTreeMap<WalletId, BTreeSet<AssetId>>>,
}

impl Graph {
    fn add_edge(&mut self, u: WalletId, v: WalletId, asset_id: AssetId) {
        self.edges.entry(u).or_default().entry(v).or_default().insert(asset_id);
    }

    fn remove_edge(&mut self, u: &WalletId, v: &WalletId, asset_id: &AssetId) {
        if let Some(targets) = self.edges.get_mut(u) {
            if let Some(witnesses) = targets.get_mut(v) {
                witnesses.remove(asset_id);
                if witnesses.is_empty() {
                    targets.remove(v);
                }
            }
            if targets.is_empty() {
                self.edges.remove(u);
            }
        }
    }

    /// Reconciles edges for `asset_id` after its owner changed from `old_owner`
    /// to `new_owner`, against the asset's current wanter set.
    fn sync_edges_for_asset(
        &mut self,
        asset_id: &AssetId,
        old_owner: Option<WalletId>,
        new_owner: Option<WalletId>,
        dirty: &mut DirtySet,
    ) {
        let wanters: Vec<WalletId> = self
            .asset_wanters
            .get(asset_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        if let Some(old) = &old_owner {
            for w in &wanters {
                if w != old {
                    self.remove_edge(w, old, asset_id);
                    dirty.insert(w.clone());
                }
            }
            dirty.insert(old.clone());
        }

        if let Some(new) = &new_owner {
            for w in &wanters {
                if w != new {
                    self.add_edge(w.clone(), new.clone(), asset_id.clone());
                    dirty.insert(w.clone());
                }
            }
            dirty.insert(new.clone());
        }
    }

    fn submit_inventory(
        &mut self,
        assets: Vec<AssetSubmission>,
        max_assets_per_wallet: usize,
    ) -> Result<DirtySet, ApiError> {
        let mut dirty = DirtySet::new();

        for submission in assets {
            let AssetSubmission {
                id,
                metadata,
                owner_id,
                valuation,
            } = submission;

            let previous_owner = self.assets.get(&id).map(|a| a.owner.clone());

            if previous_owner.as_ref() != Some(&owner_id) {
                let owned_count = self.wallets.get(&owner_id).map(|w| w.owns.len()).unwrap_or(0);
                if owned_count >= max_assets_per_wallet {
                    return Err(ApiError::TooManyAssets {
                        wallet_id: owner_id.to_string(),
                        max: max_assets_per_wallet,
                    });
                }
            }

            if let Some(old_owner) = &previous_owner {
                if old_owner != &owner_id {
                    if let Some(state) = self.wallets.get_mut(old_owner) {
                        state.owns.remove(&id);
                    }
                }
            }

            let owner_state = self.wallets.entry(owner_id.clone()).or_default();
            owner_state.owns.insert(id.clone());
            // invariant (ii): wants(w) disjoint owns(w) — silently prune
            let pruned_want = owner_state.wants.remove(&WantTarget::Asset(id.clone()));

            self.assets.insert(
                id.clone(),
                Asset {
                    id: id.clone(),
                    metadata,
                    owner: owner_id.clone(),
                    valuation,
                },
            );

            if pruned_want {
                if let Some(wanters) = self.asset_wanters.get_mut(&id) {
                    wanters.remove(&owner_id);
                    if wanters.is_empty() {
                        self.asset_wanters.remove(&id);
                    }
                }
            }

            self.sync_edges_for_asset(&id, previous_owner, Some(owner_id), &mut dirty);
        }

        Ok(dirty)
    }

    fn submit_wants(
        &mut self,
        wallet_id: WalletId,
        wants: Vec<WantTarget>,
        max_wants_per_wallet: usize,
    ) -> Result<DirtySet, ApiError> {
        let mut dirty = DirtySet::new();

        for target in wants {
            if let WantTarget::Asset(asset_id) = &target {
                let already_owned = self
                    .wallets
                    .get(&wallet_id)
                    .map(|w| w.owns.contains(asset_id))
                    .unwrap_or(false);
                if already_owned {
                    continue;
                }
            }

            let state = self.wallets.entry(wallet_id.clone()).or_default();
            if state.wants.contains(&target) {
                continue;
            }
            if state.wants.len() >= max_wants_per_wallet {
                return Err(ApiError::TooManyWants {
                    wallet_id: wallet_id.to_string(),
                    max: max_wants_per_wallet,
                });
            }
            state.wants.insert(target.clone());

            if let WantTarget::Asset(asset_id) = &target {
                self.asset_wanters
                    .entry(asset_id.clone())
                    .or_default()
                    .insert(wallet_id.clone());

                if let Some(owner) = self.assets.get(asset_id).map(|a| a.owner.clone()) {
                    if owner != wallet_id {
                        self.add_edge(wallet_id.clone(), owner.clone(), asset_id.clone());
                        dirty.insert(wallet_id.clone());
                        dirty.insert(owner);
                    }
                }
            }
        }

        Ok(dirty)
    }

    fn remove_want(&mut self, wallet_id: &WalletId, target: &WantTarget) -> DirtySet {
        let mut dirty = DirtySet::new();

        let removed = match self.wallets.get_mut(wallet_id) {
            Some(state) => state.wants.remove(target),
            None => false,
        };
        if !removed {
            return dirty;
        }

        if let WantTarget::Asset(asset_id) = target {
            if let Some(wanters) = self.asset_wanters.get_mut(asset_id) {
                wanters.remove(wallet_id);
                if wanters.is_empty() {
                    self.asset_wanters.remove(asset_id);
                }
            }
            if let Some(owner) = self.assets.get(asset_id).map(|a| a.owner.clone()) {
                self.remove_edge(wallet_id, &owner, asset_id);
                dirty.insert(wallet_id.clone());
                dirty.insert(owner);
            }
        }

        dirty
    }

    fn remove_asset(&mut self, asset_id: &AssetId) -> DirtySet {
        let mut dirty = DirtySet::new();

        let Some(asset) = self.assets.remove(asset_id) else {
            return dirty;
        };

        if let Some(state) = self.wallets.get_mut(&asset.owner) {
            state.owns.remove(asset_id);
        }
        dirty.insert(asset.owner.clone());

        if let Some(wanters) = self.asset_wanters.remove(asset_id) {
            for w in &wanters {
                self.remove_edge(w, &asset.owner, asset_id);
                dirty.insert(w.clone());
            }
        }

        dirty
    }

    fn remove_wallet(&mut self, wallet_id: &WalletId) -> DirtySet {
        let mut dirty = DirtySet::new();

        let Some(state) = self.wallets.remove(wallet_id) else {
            return dirty;
        };

        for asset_id in state.owns.clone() {
            dirty.extend(self.remove_asset(&asset_id));
        }

        for target in state.wants {
            if let WantTarget::Asset(asset_id) = &target {
                if let Some(wanters) = self.asset_wanters.get_mut(asset_id) {
                    wanters.remove(wallet_id);
                    if wanters.is_empty() {
                        self.asset_wanters.remove(asset_id);
                    }
                }
                if let Some(owner) = self.assets.get(asset_id).map(|a| a.owner.clone()) {
                    self.remove_edge(wallet_id, &owner, asset_id);
                    dirty.insert(owner);
                }
            }
        }

        self.edges.remove(wallet_id);
        dirty.insert(wallet_id.clone());
        dirty
    }

    fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            wallets: self.wallets.clone(),
            assets: self.assets.clone(),
            edges: self.edges.clone(),
        }
    }
}

/// The lock-protected handle a tenant owns: one write lock serializes all
/// mutations, reads take a `snapshot()` once and then proceed lock-free (§5).
#[derive(Default)]
pub struct TenantGraph {
    inner: RwLock<Graph>,
}

impl TenantGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit_inventory(
        &self,
        assets: Vec<AssetSubmission>,
        max_assets_per_wallet: usize,
    ) -> Result<DirtySet, ApiError> {
        self.inner.write().submit_inventory(assets, max_assets_per_wallet)
    }

    pub fn submit_wants(
        &self,
        wallet_id: WalletId,
        wants: Vec<WantTarget>,
        max_wants_per_wallet: usize,
    ) -> Result<DirtySet, ApiError> {
        self.inner
            .write()
            .submit_wants(wallet_id, wants, max_wants_per_wallet)
    }

    pub fn remove_want(&self, wallet_id: &WalletId, target: &WantTarget) -> DirtySet {
        self.inner.write().remove_want(wallet_id, target)
    }

    pub fn remove_asset(&self, asset_id: &AssetId) -> DirtySet {
        self.inner.write().remove_asset(asset_id)
    }

    pub fn remove_wallet(&self, wallet_id: &WalletId) -> DirtySet {
        self.inner.write().remove_wallet(wallet_id)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.inner.read().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Metadata;

    fn metadata(name: &str) -> Metadata {
        Metadata {
            name: name.to_owned(),
            symbol: name.to_owned(),
            image: None,
            collection_id: None,
        }
    }

    fn submission(asset_id: &str, owner: &str) -> AssetSubmission {
        AssetSubmission {
            id: AssetId::from(asset_id),
            metadata: metadata(asset_id),
            owner_id: WalletId::from(owner),
            valuation: None,
        }
    }

    #[test]
    fn two_cycle_produces_a_mutual_edge_pair() {
        let graph = TenantGraph::new();
        graph
            .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
            .unwrap();
        graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("Y"))],
                100,
            )
            .unwrap();
        graph
            .submit_wants(
                WalletId::from("B"),
                vec![WantTarget::Asset(AssetId::from("X"))],
                100,
            )
            .unwrap();

        let snapshot = graph.snapshot();
        let a = WalletId::from("A");
        let b = WalletId::from("B");
        assert!(snapshot.edges[&a][&b].contains(&AssetId::from("Y")));
        assert!(snapshot.edges[&b][&a].contains(&AssetId::from("X")));
    }

    #[test]
    fn wanting_an_owned_asset_is_silently_pruned() {
        let graph = TenantGraph::new();
        graph.submit_inventory(vec![submission("X", "A")], 100).unwrap();
        graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("X"))],
                100,
            )
            .unwrap();

        let snapshot = graph.snapshot();
        assert!(!snapshot.wallets[&WalletId::from("A")]
            .wants
            .contains(&WantTarget::Asset(AssetId::from("X"))));
    }

    #[test]
    fn ownership_transfer_moves_incoming_edges_to_the_new_owner() {
        let graph = TenantGraph::new();
        graph
            .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
            .unwrap();
        graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("Y"))],
                100,
            )
            .unwrap();
        graph
            .submit_wants(
                WalletId::from("B"),
                vec![WantTarget::Asset(AssetId::from("X"))],
                100,
            )
            .unwrap();

        // transfer X from A to C — the 2-cycle must dissolve
        graph
            .submit_inventory(vec![submission("X", "C")], 100)
            .unwrap();

        let snapshot = graph.snapshot();
        let a = WalletId::from("A");
        let b = WalletId::from("B");
        let c = WalletId::from("C");
        assert!(!snapshot.edges.get(&b).map(|t| t.contains_key(&a)).unwrap_or(false));
        assert!(snapshot.edges[&b][&c].contains(&AssetId::from("X")));
        assert!(!snapshot.wallets[&a].owns.contains(&AssetId::from("X")));
    }

    #[test]
    fn resubmitting_identical_inventory_is_idempotent() {
        let graph = TenantGraph::new();
        graph.submit_inventory(vec![submission("X", "A")], 100).unwrap();
        let before = graph.snapshot();

        graph.submit_inventory(vec![submission("X", "A")], 100).unwrap();
        let after = graph.snapshot();

        assert_eq!(before.assets, after.assets);
    }

    #[test]
    fn asset_cap_is_enforced() {
        let graph = TenantGraph::new();
        let err = graph
            .submit_inventory(vec![submission("X", "A"), submission("Y", "A")], 1)
            .unwrap_err();
        assert!(matches!(err, ApiError::TooManyAssets { max: 1, .. }));
    }
}
