// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios driving the graph, engine, scorer, cache, and
//! identity crates together, the way a real submit -> discover -> cache ->
//! invalidate lifecycle actually flows.

use tradeloop_cache::{CacheConfig, TenantCycleCache};
use tradeloop_common::{AssetId, TenantId, WalletId};
use tradeloop_engine::{BloomFilter, CycleEngine, EngineConfig, GraphScanCollectionResolver};
use tradeloop_graph::{AssetSubmission, Metadata, TenantGraph, WantTarget};
use tradeloop_identity::{RateLimitDimension, RateLimitError, RateLimiter, RateLimits};
use tradeloop_scorer::{score_cycle, NullHistoricalSignalProvider, NullMarketDataProvider};

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

/// §8: two wallets each owning what the other wants score at or above the
/// scenario's 0.9 efficiency floor, and the admitted cycle is then queryable
/// from the cache by either participant.
#[test]
fn two_cycle_is_discovered_scored_and_cached_for_both_wallets() {
    let graph = TenantGraph::new();
    graph
        .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
        .unwrap();
    let mut dirty = graph
        .submit_wants(WalletId::from("A"), vec![WantTarget::Asset(AssetId::from("Y"))], 100)
        .unwrap();
    dirty.extend(
        graph
            .submit_wants(WalletId::from("B"), vec![WantTarget::Asset(AssetId::from("X"))], 100)
            .unwrap(),
    );

    let snapshot = graph.snapshot();
    let resolver = GraphScanCollectionResolver;
    let mut seen = BloomFilter::new(100, 0.01);
    let engine = CycleEngine::new(EngineConfig::default());

    let outcome = engine.discover(&snapshot, &dirty, &resolver, &mut seen);
    assert_eq!(outcome.cycles.len(), 1);

    let cycle = outcome.cycles.into_iter().next().unwrap();
    let score = score_cycle(&cycle, &snapshot, &NullMarketDataProvider, &NullHistoricalSignalProvider);
    assert!(score.efficiency >= 0.9, "efficiency was {}", score.efficiency);

    let cache = TenantCycleCache::new(CacheConfig::default());
    cache.upsert(cycle, score);

    let for_a = cache.query_by_wallet(&WalletId::from("A"), 10, 0.0);
    let for_b = cache.query_by_wallet(&WalletId::from("B"), 10, 0.0);
    assert_eq!(for_a.len(), 1);
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_a[0].0.id, for_b[0].0.id);
}

/// §8: reassigning an asset to a new owner changes the wants graph and must
/// retire any cycle that witnessed the asset under its old owner.
#[test]
fn reassigning_an_asset_retires_the_cycle_that_witnessed_it() {
    let graph = TenantGraph::new();
    graph
        .submit_inventory(vec![submission("X", "A"), submission("Y", "B")], 100)
        .unwrap();
    let mut dirty = graph
        .submit_wants(WalletId::from("A"), vec![WantTarget::Asset(AssetId::from("Y"))], 100)
        .unwrap();
    dirty.extend(
        graph
            .submit_wants(WalletId::from("B"), vec![WantTarget::Asset(AssetId::from("X"))], 100)
            .unwrap(),
    );

    let snapshot = graph.snapshot();
    let resolver = GraphScanCollectionResolver;
    let mut seen = BloomFilter::new(100, 0.01);
    let engine = CycleEngine::new(EngineConfig::default());
    let outcome = engine.discover(&snapshot, &dirty, &resolver, &mut seen);
    let cycle = outcome.cycles.into_iter().next().unwrap();
    let score = score_cycle(&cycle, &snapshot, &NullMarketDataProvider, &NullHistoricalSignalProvider);

    let cache = TenantCycleCache::new(CacheConfig::default());
    cache.upsert(cycle, score);
    assert_eq!(cache.query_by_wallet(&WalletId::from("A"), 10, 0.0).len(), 1);

    // X moves from A to a third wallet C: A no longer witnesses the cycle.
    graph
        .submit_inventory(vec![submission("X", "C")], 100)
        .unwrap();
    cache.invalidate_asset(&AssetId::from("X"));

    assert!(cache.query_by_wallet(&WalletId::from("A"), 10, 0.0).is_empty());
}

/// §8: the same three-cycle discovered from separate dirty sets rooted at
/// each of its three wallets is suppressed as a duplicate by the bloom
/// filter, since all three runs canonicalize to the same id.
#[test]
fn canonical_dedup_holds_across_repeated_discovery_runs() {
    let graph = TenantGraph::new();
    graph
        .submit_inventory(
            vec![submission("X", "A"), submission("Y", "B"), submission("Z", "C")],
            100,
        )
        .unwrap();
    graph
        .submit_wants(WalletId::from("A"), vec![WantTarget::Asset(AssetId::from("Y"))], 100)
        .unwrap();
    graph
        .submit_wants(WalletId::from("B"), vec![WantTarget::Asset(AssetId::from("Z"))], 100)
        .unwrap();
    graph
        .submit_wants(WalletId::from("C"), vec![WantTarget::Asset(AssetId::from("X"))], 100)
        .unwrap();

    let snapshot = graph.snapshot();
    let resolver = GraphScanCollectionResolver;
    let mut seen = BloomFilter::new(100, 0.01);
    let engine = CycleEngine::new(EngineConfig::default());

    let empty_dirty = Default::default();
    let first = engine.discover(&snapshot, &empty_dirty, &resolver, &mut seen);
    assert_eq!(first.cycles.len(), 1);

    let second = engine.discover(&snapshot, &empty_dirty, &resolver, &mut seen);
    assert!(second.cycles.is_empty(), "already-seen cycle must be suppressed");
}

/// §4.7/§8: a tenant's discovery-request quota is independent of every other
/// tenant's, and rejection carries a retry-after hint.
#[test]
fn rate_limit_is_tenant_scoped_and_surfaces_retry_after() {
    let limiter = RateLimiter::new();
    let tenant_a = TenantId::new();
    let tenant_b = TenantId::new();
    let limits = RateLimits {
        discovery_requests_per_minute: 2,
        ..RateLimits::default()
    };

    limiter
        .check_and_record(tenant_a, RateLimitDimension::DiscoveryRequestsPerMinute, &limits)
        .unwrap();
    limiter
        .check_and_record(tenant_a, RateLimitDimension::DiscoveryRequestsPerMinute, &limits)
        .unwrap();

    let rejected = limiter.check_and_record(tenant_a, RateLimitDimension::DiscoveryRequestsPerMinute, &limits);
    let Err(RateLimitError::Exceeded(_, retry_after)) = rejected else {
        panic!("expected the third request in a two-request window to be rejected");
    };
    assert!(retry_after > std::time::Duration::ZERO);

    // tenant_b has not touched its own window yet.
    assert!(
        limiter
            .check_and_record(tenant_b, RateLimitDimension::DiscoveryRequestsPerMinute, &limits)
            .is_ok()
    );
}
