// SPDX-License-Identifier: Apache-2.0

//! Wiring: build `AppState`, layer the router with the body-limit/CORS/trace
//! middleware, bind, and serve until SIGTERM — the same shape as
//! `spo_api::infra::api::mod::AxumApi::serve` plus its graceful-shutdown
//! signal handler.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use thiserror::Error;
use tokio::signal::unix::{SignalKind, signal};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tradeloop_engine::GraphScanCollectionResolver;
use tradeloop_graph::{AssetSubmission, WantTarget};
use tradeloop_identity::RateLimiter;
use tradeloop_registry::TenantRegistry;
use tradeloop_webhook::{DeadLetterLog, ReqwestWebhookSender};

use crate::config::ServerConfig;
use crate::persistence;
use crate::routes;
use crate::state::AppState;

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("cannot bind to {0}")]
    Bind(std::net::SocketAddr, #[source] io::Error),
    #[error("server failed while serving")]
    Serve(#[source] io::Error),
}

/// Restores every tenant directory found under `data_dir` (§6 "Persisted
/// state layout"): the tenant's identity/config/API-key hash goes straight
/// into the registry, and its wallets/assets are replayed through the same
/// `submit_inventory`/`submit_wants` entry points a live request would use,
/// with per-wallet caps lifted since a restored snapshot already satisfied
/// them once.
fn restore_tenants(state: &AppState, data_dir: &PathBuf) {
    let ids = match persistence::discover_snapshots(data_dir) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "failed to scan data dir for snapshots");
            return;
        }
    };

    for id in ids {
        let restored = match persistence::load_tenant(data_dir, id) {
            Ok(Some(r)) => r,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(tenant_id = %id, error = %e, "failed to load tenant snapshot");
                continue;
            }
        };

        let persistence::RestoredTenant { tenant, wallets, assets } = restored;
        let tenant_id = tenant.id;
        state.registry.insert_restored(tenant);

        let tenant_state = state.tenant_state(tenant_id);
        let submissions = assets
            .into_values()
            .map(|asset| AssetSubmission {
                id: asset.id,
                metadata: asset.metadata,
                owner_id: asset.owner,
                valuation: asset.valuation,
            })
            .collect::<Vec<_>>();

        if let Err(e) = tenant_state.graph.submit_inventory(submissions, usize::MAX) {
            tracing::error!(tenant_id = %tenant_id, error = %e, "failed to replay restored inventory");
        }

        for (wallet_id, wallet_state) in wallets {
            let wants: Vec<WantTarget> = wallet_state.wants.into_iter().collect();
            if wants.is_empty() {
                continue;
            }
            if let Err(e) = tenant_state.graph.submit_wants(wallet_id.clone(), wants, usize::MAX) {
                tracing::error!(tenant_id = %tenant_id, wallet_id = %wallet_id, error = %e, "failed to replay restored wants");
            }
        }

        tracing::info!(tenant_id = %tenant_id, "restored tenant from snapshot");
    }
}

/// Periodically walks every registered tenant and writes its snapshot, the
/// "optional periodic snapshots" of §6/§9. Runs for the life of the process;
/// a single tenant's write failure is logged and never aborts the loop.
fn spawn_snapshot_loop(state: Arc<AppState>, data_dir: PathBuf) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
        ticker.tick().await; // first tick fires immediately; skip it, nothing to save yet
        loop {
            ticker.tick().await;
            save_all_tenants(&state, &data_dir);
        }
    });
}

fn save_all_tenants(state: &AppState, data_dir: &PathBuf) {
    for tenant_handle in state.registry.snapshot_handles() {
        let tenant = tenant_handle.read().clone();
        let tenant_state = state.tenant_state(tenant.id);
        let snapshot = tenant_state.graph.snapshot();
        if let Err(e) = persistence::save_tenant(data_dir, &tenant, &snapshot) {
            tracing::error!(tenant_id = %tenant.id, error = %e, "failed to write tenant snapshot");
        }
    }
}

fn build_state(config: ServerConfig) -> AppState {
    AppState {
        registry: Arc::new(TenantRegistry::new()),
        tenant_states: Default::default(),
        dispatch_queues: Default::default(),
        rate_limiter: Arc::new(RateLimiter::new()),
        dead_letters: Arc::new(DeadLetterLog::new()),
        webhook_sender: Arc::new(ReqwestWebhookSender::new(
            std::time::Duration::from_millis(500),
            config.webhook_timeout(),
        )),
        collection_resolver: GraphScanCollectionResolver,
        admin_api_key: config.admin_api_key.clone(),
        config,
    }
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let bind_address = config.bind_address;
    let request_body_limit = config.request_body_limit_bytes as usize;

    let state = Arc::new(build_state(config));

    if state.config.enable_persistence {
        if let Some(data_dir) = state.config.data_dir.clone() {
            restore_tenants(&state, &data_dir);
            spawn_snapshot_loop(state.clone(), data_dir);
        } else {
            tracing::warn!("enable_persistence is set but data_dir is empty, persistence disabled");
        }
    }

    let app = routes::router(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(request_body_limit))
                .layer(CorsLayer::permissive())
                .layer(TraceLayer::new_for_http()),
        );

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| ServeError::Bind(bind_address, e))?;

    tracing::info!(address = %bind_address, "listening for HTTP connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServeError::Serve)
        .context("serving tradeloop API")
}

async fn shutdown_signal() {
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
            tracing::warn!("SIGTERM received, shutting down");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
        }
    }
}
