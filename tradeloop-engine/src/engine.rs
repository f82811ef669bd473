// SPDX-License-Identifier: Apache-2.0

//! §4.2 Cycle Engine: SCC decomposition scoped to the dirty set, bounded
//! simple-cycle enumeration (a length-pruned, Johnson's-style DFS restricted
//! to vertices no smaller than the cycle's start, so each simple cycle is
//! discovered exactly once, from its lexicographically smallest vertex),
//! canonicalization by least rotation, and optional bundle detection.

use crate::bloom::BloomFilter;
use crate::cycle::{Bundle, Cycle, CycleStep};
use crate::resolver::CollectionResolver;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tradeloop_common::{AssetId, WalletId};
use tradeloop_graph::{GraphSnapshot, WantTarget};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_cycle_length: usize,
    pub max_cycles_per_scc: usize,
    pub wall_clock_timeout: Duration,
    pub bundle_detection_enabled: bool,
    pub max_bundle_alternatives: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cycle_length: 10,
            max_cycles_per_scc: 500,
            wall_clock_timeout: Duration::from_millis(250),
            bundle_detection_enabled: false,
            max_bundle_alternatives: 4,
        }
    }
}

#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub cycles: Vec<Cycle>,
    pub bundles: Vec<Bundle>,
    pub timed_out: bool,
    pub truncated_scc_count: usize,
}

pub struct CycleEngine {
    config: EngineConfig,
}

impl CycleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Enumerates simple cycles touching `dirty` (or, if `dirty` is empty, the
    /// whole graph — used for cold-start/administrative re-discovery), against
    /// at most one canonical cycle per SCC-scoped vertex sequence/asset choice.
    pub fn discover(
        &self,
        snapshot: &GraphSnapshot,
        dirty: &BTreeSet<WalletId>,
        resolver: &dyn CollectionResolver,
        seen_canonical_ids: &mut BloomFilter,
    ) -> DiscoveryOutcome {
        let deadline = Instant::now() + self.config.wall_clock_timeout;
        let (graph, _index_of) = build_petgraph(snapshot);
        let sccs = tarjan_scc(&graph);

        let mut outcome = DiscoveryOutcome::default();

        for scc_nodes in sccs {
            if scc_nodes.len() < 2 {
                continue;
            }

            let scc: BTreeSet<WalletId> = scc_nodes.iter().map(|&idx| graph[idx].clone()).collect();
            if !dirty.is_empty() && scc.intersection(dirty).next().is_none() {
                continue;
            }

            if Instant::now() > deadline {
                outcome.timed_out = true;
                break;
            }

            let (raw_cycles, scc_truncated) = enumerate_scc(
                &scc,
                snapshot,
                resolver,
                self.config.max_cycle_length,
                self.config.max_cycles_per_scc,
                deadline,
            );
            if scc_truncated {
                outcome.truncated_scc_count += 1;
            }

            for wallets in raw_cycles {
                let Some((cycle, alternates)) =
                    build_cycle(&wallets, snapshot, resolver, &self.config)
                else {
                    continue;
                };

                if seen_canonical_ids.might_contain(cycle.id.as_str()) {
                    continue;
                }
                seen_canonical_ids.insert(cycle.id.as_str());

                if self.config.bundle_detection_enabled && !alternates.is_empty() {
                    outcome.bundles.push(Bundle {
                        representative: cycle.clone(),
                        alternatives: alternates,
                    });
                }
                outcome.cycles.push(cycle);
            }

            if Instant::now() > deadline {
                outcome.timed_out = true;
                break;
            }
        }

        outcome
    }
}

fn build_petgraph(snapshot: &GraphSnapshot) -> (DiGraph<WalletId, ()>, BTreeMap<WalletId, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index_of = BTreeMap::new();

    for wallet_id in snapshot.wallets.keys() {
        let idx = graph.add_node(wallet_id.clone());
        index_of.insert(wallet_id.clone(), idx);
    }
    for (u, targets) in &snapshot.edges {
        let Some(&ui) = index_of.get(u) else { continue };
        for v in targets.keys() {
            let Some(&vi) = index_of.get(v) else { continue };
            graph.add_edge(ui, vi, ());
        }
    }

    (graph, index_of)
}

/// Assets witnessing the edge `u -> v`: explicit asset wants plus any
/// collection want of `u` resolved to an asset `v` currently owns.
fn witnesses(
    u: &WalletId,
    v: &WalletId,
    snapshot: &GraphSnapshot,
    resolver: &dyn CollectionResolver,
) -> BTreeSet<AssetId> {
    let mut out = snapshot
        .edges
        .get(u)
        .and_then(|targets| targets.get(v))
        .cloned()
        .unwrap_or_default();

    if let Some(wallet) = snapshot.wallets.get(u) {
        for target in &wallet.wants {
            if let WantTarget::Collection(collection_id) = target {
                for asset_id in resolver.resolve(collection_id, snapshot) {
                    if snapshot.assets.get(&asset_id).map(|a| &a.owner) == Some(v) {
                        out.insert(asset_id);
                    }
                }
            }
        }
    }

    out
}

fn neighbors(
    u: &WalletId,
    scc: &BTreeSet<WalletId>,
    snapshot: &GraphSnapshot,
    resolver: &dyn CollectionResolver,
) -> BTreeSet<WalletId> {
    let mut out: BTreeSet<WalletId> = snapshot
        .neighbors(u)
        .map(|(v, _)| v.clone())
        .filter(|v| scc.contains(v))
        .collect();

    if let Some(wallet) = snapshot.wallets.get(u) {
        for target in &wallet.wants {
            if let WantTarget::Collection(collection_id) = target {
                for asset_id in resolver.resolve(collection_id, snapshot) {
                    if let Some(asset) = snapshot.assets.get(&asset_id) {
                        if scc.contains(&asset.owner) {
                            out.insert(asset.owner.clone());
                        }
                    }
                }
            }
        }
    }

    out
}

/// Bounded DFS over one SCC. Cycles are emitted as their raw wallet sequence
/// starting from `start`; only vertices `>= start` are explored, the
/// classical Johnson's restriction that guarantees each simple cycle is found
/// exactly once, from its minimum vertex.
#[allow(clippy::too_many_arguments)]
fn enumerate_scc(
    scc: &BTreeSet<WalletId>,
    snapshot: &GraphSnapshot,
    resolver: &dyn CollectionResolver,
    max_length: usize,
    max_cycles: usize,
    deadline: Instant,
) -> (Vec<Vec<WalletId>>, bool) {
    let mut out = Vec::new();
    let mut truncated = false;

    for start in scc {
        let mut visited = BTreeSet::new();
        visited.insert(start.clone());
        let mut path = vec![start.clone()];

        dfs(
            start,
            start,
            &mut path,
            &mut visited,
            scc,
            snapshot,
            resolver,
            max_length,
            max_cycles,
            deadline,
            &mut out,
            &mut truncated,
        );

        if truncated || Instant::now() > deadline {
            break;
        }
    }

    (out, truncated)
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    start: &WalletId,
    current: &WalletId,
    path: &mut Vec<WalletId>,
    visited: &mut BTreeSet<WalletId>,
    scc: &BTreeSet<WalletId>,
    snapshot: &GraphSnapshot,
    resolver: &dyn CollectionResolver,
    max_length: usize,
    max_cycles: usize,
    deadline: Instant,
    out: &mut Vec<Vec<WalletId>>,
    truncated: &mut bool,
) {
    if *truncated || Instant::now() > deadline {
        return;
    }

    for next in neighbors(current, scc, snapshot, resolver) {
        if &next < start {
            continue;
        }

        if &next == start {
            if path.len() >= 2 {
                out.push(path.clone());
                if out.len() >= max_cycles {
                    *truncated = true;
                    return;
                }
            }
            continue;
        }

        if visited.contains(&next) || path.len() >= max_length {
            continue;
        }

        visited.insert(next.clone());
        path.push(next.clone());
        dfs(
            start, &next, path, visited, scc, snapshot, resolver, max_length, max_cycles,
            deadline, out, truncated,
        );
        path.pop();
        visited.remove(&next);

        if *truncated || Instant::now() > deadline {
            return;
        }
    }
}

/// The lexicographically smallest rotation of `wallets`, by simple pairwise
/// comparison — cycles are bounded by `max_cycle_length` (≤ 10), so the
/// O(k²) brute force is cheaper than it looks and needs no special-casing.
fn canonical_rotation(wallets: &[WalletId]) -> usize {
    let k = wallets.len();
    let mut best = 0;
    for start in 1..k {
        for j in 0..k {
            let a = &wallets[(best + j) % k];
            let b = &wallets[(start + j) % k];
            match a.cmp(b) {
                Ordering::Less => break,
                Ordering::Greater => {
                    best = start;
                    break;
                }
                Ordering::Equal => continue,
            }
        }
    }
    best
}

fn rotate(wallets: &[WalletId], start: usize) -> Vec<WalletId> {
    let k = wallets.len();
    (0..k).map(|i| wallets[(start + i) % k].clone()).collect()
}

fn canonical_id_of(wallets: &[WalletId], chosen: &[AssetId]) -> String {
    let wallet_part = wallets
        .iter()
        .map(|w| w.as_str())
        .collect::<Vec<_>>()
        .join(">");
    let asset_part = chosen
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("{wallet_part}|{asset_part}")
}

/// Builds the canonical representative `Cycle` for a raw wallet sequence,
/// picking the lexicographically smallest witnessing asset per step, plus up
/// to `max_bundle_alternatives` single-step substitutions for the bundle
/// manifest.
fn build_cycle(
    wallets: &[WalletId],
    snapshot: &GraphSnapshot,
    resolver: &dyn CollectionResolver,
    config: &EngineConfig,
) -> Option<(Cycle, Vec<Cycle>)> {
    let start = canonical_rotation(wallets);
    let rotated = rotate(wallets, start);
    let k = rotated.len();

    let mut per_step_witnesses = Vec::with_capacity(k);
    let mut chosen = Vec::with_capacity(k);
    for i in 0..k {
        let from = &rotated[i];
        let to = &rotated[(i + 1) % k];
        let witness_set = witnesses(from, to, snapshot, resolver);
        let min_asset = witness_set.iter().min().cloned()?;
        chosen.push(min_asset);
        per_step_witnesses.push(witness_set);
    }

    let id = tradeloop_common::CanonicalCycleId::new(canonical_id_of(&rotated, &chosen));
    let steps = build_steps(&rotated, &chosen);
    let representative = Cycle {
        id,
        wallets: rotated.clone(),
        steps,
    };

    let mut alternatives = Vec::new();
    if config.bundle_detection_enabled {
        'steps: for (i, witness_set) in per_step_witnesses.iter().enumerate() {
            for alt_asset in witness_set.iter().filter(|a| *a != &chosen[i]) {
                if alternatives.len() >= config.max_bundle_alternatives {
                    break 'steps;
                }
                let mut alt_chosen = chosen.clone();
                alt_chosen[i] = alt_asset.clone();
                let alt_id =
                    tradeloop_common::CanonicalCycleId::new(canonical_id_of(&rotated, &alt_chosen));
                alternatives.push(Cycle {
                    id: alt_id,
                    wallets: rotated.clone(),
                    steps: build_steps(&rotated, &alt_chosen),
                });
            }
        }
    }

    Some((representative, alternatives))
}

fn build_steps(rotated: &[WalletId], chosen: &[AssetId]) -> Vec<CycleStep> {
    let k = rotated.len();
    (0..k)
        .map(|i| CycleStep {
            from: rotated[i].clone(),
            to: rotated[(i + 1) % k].clone(),
            nfts: vec![chosen[i].clone()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::GraphScanCollectionResolver;
    use tradeloop_graph::{AssetSubmission, Metadata, TenantGraph};

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

    fn engine() -> CycleEngine {
        CycleEngine::new(EngineConfig::default())
    }

    #[test]
    fn discovers_a_two_cycle() {
        let graph = TenantGraph::new();
        graph
            .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
            .unwrap();
        let mut dirty = graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("Y"))],
                100,
            )
            .unwrap();
        dirty.extend(
            graph
                .submit_wants(
                    WalletId::from("B"),
                    vec![WantTarget::Asset(AssetId::from("X"))],
                    100,
                )
                .unwrap(),
        );

        let snapshot = graph.snapshot();
        let resolver = GraphScanCollectionResolver;
        let mut seen = BloomFilter::new(100, 0.01);

        let outcome = engine().discover(&snapshot, &dirty, &resolver, &mut seen);

        assert_eq!(outcome.cycles.len(), 1);
        let cycle = &outcome.cycles[0];
        assert_eq!(cycle.total_participants(), 2);
        assert_eq!(cycle.steps.len(), 2);
    }

    #[test]
    fn three_cycle_is_found_once_regardless_of_starting_wallet() {
        let graph = TenantGraph::new();
        graph
            .submit_inventory(
                vec![
                    submission("X", "A"),
                    submission("Y", "B"),
                    submission("Z", "C"),
                ],
                100,
            )
            .unwrap();
        let mut dirty = graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("Y"))],
                100,
            )
            .unwrap();
        dirty.extend(
            graph
                .submit_wants(
                    WalletId::from("B"),
                    vec![WantTarget::Asset(AssetId::from("Z"))],
                    100,
                )
                .unwrap(),
        );
        dirty.extend(
            graph
                .submit_wants(
                    WalletId::from("C"),
                    vec![WantTarget::Asset(AssetId::from("X"))],
                    100,
                )
                .unwrap(),
        );

        let snapshot = graph.snapshot();
        let resolver = GraphScanCollectionResolver;
        let mut seen = BloomFilter::new(100, 0.01);

        let outcome = engine().discover(&snapshot, &dirty, &resolver, &mut seen);

        assert_eq!(outcome.cycles.len(), 1);
        assert_eq!(outcome.cycles[0].total_participants(), 3);
    }

    #[test]
    fn no_cycle_when_wants_target_nothing_owned() {
        let graph = TenantGraph::new();
        graph
            .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
            .unwrap();
        let dirty = graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("NONEXISTENT"))],
                100,
            )
            .unwrap();

        let snapshot = graph.snapshot();
        let resolver = GraphScanCollectionResolver;
        let mut seen = BloomFilter::new(100, 0.01);

        let outcome = engine().discover(&snapshot, &dirty, &resolver, &mut seen);

        assert!(outcome.cycles.is_empty());
    }

    #[test]
    fn bloom_filter_suppresses_a_cycle_already_seen() {
        let graph = TenantGraph::new();
        graph
            .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
            .unwrap();
        let mut dirty = graph
            .submit_wants(
                WalletId::from("A"),
                vec![WantTarget::Asset(AssetId::from("Y"))],
                100,
            )
            .unwrap();
        dirty.extend(
            graph
                .submit_wants(
                    WalletId::from("B"),
                    vec![WantTarget::Asset(AssetId::from("X"))],
                    100,
                )
                .unwrap(),
        );

        let snapshot = graph.snapshot();
        let resolver = GraphScanCollectionResolver;
        let mut seen = BloomFilter::new(100, 0.01);

        let first = engine().discover(&snapshot, &dirty, &resolver, &mut seen);
        assert_eq!(first.cycles.len(), 1);

        let second = engine().discover(&snapshot, &dirty, &resolver, &mut seen);
        assert!(second.cycles.is_empty());
    }
}
