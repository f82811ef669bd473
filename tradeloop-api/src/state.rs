// SPDX-License-Identifier: Apache-2.0

//! Process-wide application state: the Tenant Registry plus, per tenant, the
//! graph/cache/bloom-filter resources the registry itself has no opinion
//! about (§3: "a Tenant exclusively owns its Graph, Cycle Cache, and
//! per-tenant usage counters").

use dashmap::DashMap;
use parking_lot::Mutex;
use secrecy::SecretString;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tradeloop_cache::TenantCycleCache;
use tradeloop_common::TenantId;
use tradeloop_engine::{BloomFilter, GraphScanCollectionResolver};
use tradeloop_graph::TenantGraph;
use tradeloop_identity::RateLimiter;
use tradeloop_registry::TenantRegistry;
use tradeloop_webhook::{DeadLetterLog, ReqwestWebhookSender};

use crate::config::ServerConfig;

/// The per-tenant resources the Tenant Registry doesn't itself own.
pub struct TenantState {
    pub graph: TenantGraph,
    pub cache: TenantCycleCache,
    pub seen_canonical_ids: Mutex<BloomFilter>,
}

impl TenantState {
    fn new() -> Self {
        Self {
            graph: TenantGraph::new(),
            cache: TenantCycleCache::default(),
            seen_canonical_ids: Mutex::new(BloomFilter::new(10_000, 0.01)),
        }
    }
}

/// The serialized event queue of §4.5: one lock per tenant, plus a depth
/// counter so backpressure can be checked without ever blocking on the lock.
pub struct DispatchQueue {
    pub lock: AsyncMutex<()>,
    pub depth: AtomicUsize,
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self {
            lock: AsyncMutex::new(()),
            depth: AtomicUsize::new(0),
        }
    }
}

pub struct AppState {
    pub registry: Arc<TenantRegistry>,
    pub tenant_states: DashMap<TenantId, Arc<TenantState>>,
    pub dispatch_queues: DashMap<TenantId, Arc<DispatchQueue>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub dead_letters: Arc<DeadLetterLog>,
    pub webhook_sender: Arc<ReqwestWebhookSender>,
    pub collection_resolver: GraphScanCollectionResolver,
    pub admin_api_key: SecretString,
    pub config: ServerConfig,
}

impl AppState {
    pub fn tenant_state(&self, tenant_id: TenantId) -> Arc<TenantState> {
        self.tenant_states
            .entry(tenant_id)
            .or_insert_with(|| Arc::new(TenantState::new()))
            .clone()
    }

    pub fn dispatch_queue(&self, tenant_id: TenantId) -> Arc<DispatchQueue> {
        self.dispatch_queues
            .entry(tenant_id)
            .or_insert_with(|| Arc::new(DispatchQueue::default()))
            .clone()
    }
}
