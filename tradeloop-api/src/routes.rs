// SPDX-License-Identifier: Apache-2.0

//! §6 External Interfaces: the HTTP/JSON handlers, one per endpoint. Kept
//! thin — each handler converts its DTO, calls into the registry/dispatcher,
//! and converts the result back into a DTO. No business logic lives here.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use tradeloop_common::{ApiError, TenantId};
use tradeloop_identity::RateLimitDimension;
use tradeloop_registry::TenantSettings;

use crate::auth::{AdminCaller, AuthenticatedTenant};
use crate::dto::*;
use crate::error_response::ApiErrorResponse;
use crate::state::AppState;
use crate::{dispatcher, rate_limit};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin/tenants", post(create_tenant))
        .route("/admin/tenants/{id}", delete(delete_tenant))
        .route("/admin/tenants/{id}/rotate-key", post(rotate_key))
        .route("/inventory/submit", post(submit_inventory))
        .route("/wants/submit", post(submit_wants))
        .route("/discovery/trades", post(discover_trades))
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(state)
}

async fn create_tenant(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
    Json(req): Json<CreateTenantRequest>,
) -> Result<Json<CreateTenantResponse>, ApiErrorResponse> {
    let settings: TenantSettings = req.into();
    let name = settings.name.clone();
    let contact_email = settings.contact_email.clone();
    let (id, api_key) = state.registry.create(settings);

    Ok(Json(CreateTenantResponse {
        tenant: TenantView {
            id,
            name,
            contact_email,
        },
        api_key: api_key.expose().to_owned(),
    }))
}

async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
    Path(id): Path<TenantId>,
) -> Result<(), ApiErrorResponse> {
    state
        .registry
        .delete(id)
        .map_err(|_| ApiError::NotFound {
            resource: "tenant",
            id: id.to_string(),
        })?;
    state.tenant_states.remove(&id);
    state.dispatch_queues.remove(&id);
    Ok(())
}

async fn rotate_key(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
    Path(id): Path<TenantId>,
) -> Result<Json<RotateKeyResponse>, ApiErrorResponse> {
    let new_key = state
        .registry
        .rotate_api_key(id)
        .map_err(|_| ApiError::NotFound {
            resource: "tenant",
            id: id.to_string(),
        })?;

    Ok(Json(RotateKeyResponse {
        api_key: new_key.expose().to_owned(),
    }))
}

async fn submit_inventory(
    State(state): State<Arc<AppState>>,
    tenant: AuthenticatedTenant,
    Json(req): Json<SubmitInventoryRequest>,
) -> Result<Json<SubmitInventoryResponse>, ApiErrorResponse> {
    rate_limit::check(
        &state,
        tenant.tenant_id,
        RateLimitDimension::AssetSubmissionsPerDay,
        &tenant.config.rate_limits,
    )?;

    let assets = req.nfts.into_iter().map(Into::into).collect();
    let outcome = dispatcher::submit_inventory(&state, tenant.tenant_id, assets).await?;

    Ok(Json(SubmitInventoryResponse {
        success: true,
        new_loops_discovered: outcome.new_loops_discovered,
        changed_wallets: outcome.changed_wallets,
    }))
}

async fn submit_wants(
    State(state): State<Arc<AppState>>,
    tenant: AuthenticatedTenant,
    Json(req): Json<SubmitWantsRequest>,
) -> Result<Json<SubmitWantsResponse>, ApiErrorResponse> {
    rate_limit::check(
        &state,
        tenant.tenant_id,
        RateLimitDimension::AssetSubmissionsPerDay,
        &tenant.config.rate_limits,
    )?;

    let wants = req.wanted_nfts.into_iter().map(Into::into).collect();
    let outcome = dispatcher::submit_wants(
        &state,
        tenant.tenant_id,
        req.wallet_id,
        wants,
        tenant.config.max_wants_per_wallet,
    )
    .await?;

    Ok(Json(SubmitWantsResponse {
        success: true,
        new_loops_discovered: outcome.new_loops_discovered,
    }))
}

async fn discover_trades(
    State(state): State<Arc<AppState>>,
    tenant: AuthenticatedTenant,
    Json(req): Json<DiscoveryRequest>,
) -> Result<Json<DiscoveryResponse>, ApiErrorResponse> {
    rate_limit::check(
        &state,
        tenant.tenant_id,
        RateLimitDimension::DiscoveryRequestsPerMinute,
        &tenant.config.rate_limits,
    )?;

    let tenant_state = state.tenant_state(tenant.tenant_id);
    let min_score = req.min_score.max(tenant.config.min_efficiency);
    let limit = req.limit.min(tenant.config.max_cycles_per_request);

    let trades = tenant_state
        .cache
        .query_by_wallet(&req.wallet_id, limit, min_score)
        .into_iter()
        .map(|(cycle, score)| CycleView::from_cycle_and_score(&cycle, score.efficiency, score.quality_score))
        .collect();

    Ok(Json(DiscoveryResponse { trades }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let tenants = state
        .tenant_states
        .iter()
        .map(|entry| TenantUsage {
            tenant_id: *entry.key(),
            wallet_count: entry.value().graph.snapshot().wallets.len(),
            cached_cycle_count: entry.value().cache.len(),
        })
        .collect();

    Json(StatusResponse { tenants })
}
