// SPDX-License-Identifier: Apache-2.0

//! §4.5 Event Dispatcher: the one path every mutation takes between the HTTP
//! handlers and the Cycle Engine/Scorer/Cache. Serialized per tenant by a
//! `DispatchQueue`; a depth counter is checked before the lock is even
//! attempted so backpressure never queues unboundedly (§4.5, §5).

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use tradeloop_common::{ApiError, TenantId};
use tradeloop_engine::{CycleEngine, EngineConfig};
use tradeloop_graph::{AssetSubmission, DirtySet, WantTarget};
use tradeloop_registry::TenantConfig;
use tradeloop_scorer::{score_cycle, NullHistoricalSignalProvider, NullMarketDataProvider};
use tradeloop_webhook::{deliver, DeliveryConfig, WebhookPayload};

use crate::state::{AppState, TenantState};

/// Result of running one mutation through the engine and cache (§6
/// `SubmitInventoryResponse`/`SubmitWantsResponse` are built directly from
/// this).
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub new_loops_discovered: usize,
    pub changed_wallets: Vec<tradeloop_common::WalletId>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Acquires the per-tenant queue, checking depth against
/// `max_queue_depth` *before* touching the lock — a saturated tenant gets
/// `Busy` immediately rather than piling up behind a mutex.
async fn run_dispatch<F>(
    state: &Arc<AppState>,
    tenant_id: TenantId,
    mutate: F,
) -> Result<DispatchOutcome, ApiError>
where
    F: FnOnce(&TenantState, usize) -> Result<DirtySet, ApiError>,
{
    let queue = state.dispatch_queue(tenant_id);

    if queue.depth.load(Ordering::Acquire) >= state.config.max_queue_depth {
        return Err(ApiError::Busy);
    }
    queue.depth.fetch_add(1, Ordering::AcqRel);
    let _guard = scopeguard(&queue.depth);

    let _permit = queue.lock.lock().await;

    let tenant_state = state.tenant_state(tenant_id);
    let tenant_config = state
        .registry
        .get(tenant_id)
        .map_err(|_| ApiError::NotFound {
            resource: "tenant",
            id: tenant_id.to_string(),
        })?
        .read()
        .config
        .clone();

    let dirty = mutate(&tenant_state, tenant_config.max_assets_per_wallet)?;
    if dirty.is_empty() {
        return Ok(DispatchOutcome::default());
    }

    // Retire every cached cycle touching a wallet whose edges just changed
    // before re-discovering: an edge that moved (asset reassigned) or
    // vanished (want withdrawn) necessarily touches both of its endpoints, so
    // walking `dirty` catches every stale cycle without tracking asset ids
    // separately.
    for wallet_id in &dirty {
        tenant_state.cache.invalidate_wallet(wallet_id);
    }

    let outcome = discover_and_cache(state, tenant_id, &tenant_state, &tenant_config, &dirty).await;
    Ok(DispatchOutcome {
        new_loops_discovered: outcome,
        changed_wallets: dirty.into_iter().collect(),
    })
}

/// RAII decrement so the depth counter drops back down on every exit path,
/// including an early `?` return from `mutate`.
struct DepthGuard<'a>(&'a std::sync::atomic::AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn scopeguard(depth: &std::sync::atomic::AtomicUsize) -> DepthGuard<'_> {
    DepthGuard(depth)
}

async fn discover_and_cache(
    state: &Arc<AppState>,
    tenant_id: TenantId,
    tenant_state: &Arc<TenantState>,
    tenant_config: &TenantConfig,
    dirty: &DirtySet,
) -> usize {
    let snapshot = tenant_state.graph.snapshot();
    let engine = CycleEngine::new(EngineConfig {
        max_cycle_length: tenant_config.max_cycle_length,
        bundle_detection_enabled: tenant_config.bundle_detection_enabled,
        ..EngineConfig::default()
    });

    let outcome = {
        let mut bloom = tenant_state.seen_canonical_ids.lock();
        engine.discover(&snapshot, dirty, &state.collection_resolver, &mut bloom)
    };

    if outcome.timed_out {
        tracing::warn!(tenant_id = %tenant_id, "cycle discovery hit its wall-clock deadline");
    }

    let market = NullMarketDataProvider;
    let historical = NullHistoricalSignalProvider;
    let mut admitted = 0usize;

    for cycle in outcome.cycles {
        let score = score_cycle(&cycle, &snapshot, &market, &historical);
        if score.efficiency < tenant_config.min_efficiency {
            continue;
        }
        tenant_state.cache.upsert(cycle.clone(), score.clone());
        admitted += 1;

        dispatch_webhook(state, tenant_id, tenant_config, cycle, score);
    }

    admitted
}

/// Fire-and-forget: a slow or failing webhook endpoint never blocks or fails
/// the originating submit (§4.6).
fn dispatch_webhook(
    state: &Arc<AppState>,
    tenant_id: TenantId,
    tenant_config: &TenantConfig,
    cycle: tradeloop_engine::Cycle,
    score: tradeloop_scorer::Score,
) {
    let Some(url) = tenant_config.webhook_url.clone() else {
        return;
    };

    let Ok(tenant_handle) = state.registry.get(tenant_id) else {
        return;
    };
    let Some(secret) = tenant_handle.read().webhook_secret().cloned() else {
        tracing::warn!(tenant_id = %tenant_id, "webhook_url configured without a webhook secret, skipping delivery");
        return;
    };

    let sender = state.webhook_sender.clone();
    let dead_letters = state.dead_letters.clone();
    let config = DeliveryConfig {
        max_attempts: state.config.webhook_max_attempts,
        read_timeout: state.config.webhook_timeout(),
        ..DeliveryConfig::default()
    };

    tokio::spawn(async move {
        let (payload, unsigned_body) = WebhookPayload::new(tenant_id, cycle, score, now_millis());
        if let Err(e) = deliver(sender.as_ref(), dead_letters.as_ref(), &url, &secret, payload, unsigned_body, config).await {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "webhook delivery exhausted its retries");
        }
    });
}

pub async fn submit_inventory(
    state: &Arc<AppState>,
    tenant_id: TenantId,
    assets: Vec<AssetSubmission>,
) -> Result<DispatchOutcome, ApiError> {
    run_dispatch(state, tenant_id, move |tenant_state, max_per_wallet| {
        tenant_state.graph.submit_inventory(assets, max_per_wallet)
    })
    .await
}

pub async fn submit_wants(
    state: &Arc<AppState>,
    tenant_id: TenantId,
    wallet_id: tradeloop_common::WalletId,
    wants: Vec<WantTarget>,
    max_wants_per_wallet: usize,
) -> Result<DispatchOutcome, ApiError> {
    run_dispatch(state, tenant_id, move |tenant_state, _max_assets| {
        tenant_state
            .graph
            .submit_wants(wallet_id, wants, max_wants_per_wallet)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use secrecy::SecretString;
    use tradeloop_common::WalletId;
    use tradeloop_graph::Metadata;
    use tradeloop_identity::RateLimiter;
    use tradeloop_registry::{TenantRegistry, TenantSettings};
    use tradeloop_webhook::{DeadLetterLog, ReqwestWebhookSender};

    fn test_state() -> (Arc<AppState>, TenantId) {
        let registry = TenantRegistry::new();
        let (tenant_id, _key) = registry.create(TenantSettings {
            name: "acme".to_owned(),
            contact_email: "ops@acme.test".to_owned(),
            config: TenantConfig::default(),
        });

        let config = ServerConfig {
            admin_api_key: SecretString::from("admin".to_owned()),
            bind_address: ([127, 0, 0, 1], 0).into(),
            data_dir: None,
            enable_persistence: false,
            max_cycle_depth: 10,
            min_efficiency: 0.0,
            max_queue_depth: 256,
            request_body_limit_bytes: 1024 * 1024,
            webhook_timeout_ms: 3_000,
            webhook_max_attempts: 5,
            metrics: Default::default(),
        };

        let state = Arc::new(AppState {
            registry: Arc::new(registry),
            tenant_states: Default::default(),
            dispatch_queues: Default::default(),
            rate_limiter: Arc::new(RateLimiter::new()),
            dead_letters: Arc::new(DeadLetterLog::new()),
            webhook_sender: Arc::new(ReqwestWebhookSender::new(
                std::time::Duration::from_millis(500),
                config.webhook_timeout(),
            )),
            collection_resolver: tradeloop_engine::GraphScanCollectionResolver,
            admin_api_key: config.admin_api_key.clone(),
            config,
        });

        (state, tenant_id)
    }

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
            id: tradeloop_common::AssetId::from(asset_id),
            metadata: metadata(asset_id),
            owner_id: WalletId::from(owner),
            valuation: None,
        }
    }

    /// Reassigning an asset through the real dispatch path must retire the
    /// stale cycle in the cache, not just leave it for a future re-discovery
    /// to overwrite.
    #[tokio::test]
    async fn ownership_transfer_through_dispatch_invalidates_the_stale_cycle() {
        let (state, tenant_id) = test_state();

        submit_inventory(
            &state,
            tenant_id,
            vec![submission("X", "A"), submission("Y", "B")],
        )
        .await
        .unwrap();
        submit_wants(
            &state,
            tenant_id,
            WalletId::from("A"),
            vec![WantTarget::Asset(tradeloop_common::AssetId::from("Y"))],
            100,
        )
        .await
        .unwrap();
        submit_wants(
            &state,
            tenant_id,
            WalletId::from("B"),
            vec![WantTarget::Asset(tradeloop_common::AssetId::from("X"))],
            100,
        )
        .await
        .unwrap();

        let tenant_state = state.tenant_state(tenant_id);
        assert_eq!(tenant_state.cache.query_by_wallet(&WalletId::from("A"), 10, 0.0).len(), 1);

        // X moves from A to C: the cycle A<->B no longer exists.
        submit_inventory(&state, tenant_id, vec![submission("X", "C")])
            .await
            .unwrap();

        assert!(tenant_state
            .cache
            .query_by_wallet(&WalletId::from("A"), 10, 0.0)
            .is_empty());
        assert!(tenant_state
            .cache
            .query_by_wallet(&WalletId::from("B"), 10, 0.0)
            .is_empty());
    }
}
