// SPDX-License-Identifier: Apache-2.0

//! §6 request/response bodies. Kept deliberately thin: these are wire shapes,
//! not domain types — they get converted into/out of the domain types the
//! other crates own as soon as possible.

use serde::{Deserialize, Serialize};
use tradeloop_common::{AssetId, CanonicalCycleId, CollectionId, TenantId, WalletId};
use tradeloop_engine::Cycle;
use tradeloop_graph::{AssetSubmission, Metadata, Valuation, WantTarget};
use tradeloop_registry::TenantSettings;

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub contact_email: String,
    #[serde(default)]
    pub settings: Option<tradeloop_registry::TenantConfig>,
}

impl From<CreateTenantRequest> for TenantSettings {
    fn from(req: CreateTenantRequest) -> Self {
        TenantSettings {
            name: req.name,
            contact_email: req.contact_email,
            config: req.settings.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TenantView {
    pub id: TenantId,
    pub name: String,
    pub contact_email: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTenantResponse {
    pub tenant: TenantView,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct RotateKeyResponse {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnershipDto {
    pub owner_id: WalletId,
}

#[derive(Debug, Deserialize)]
pub struct NftSubmissionDto {
    pub id: AssetId,
    pub metadata: Metadata,
    pub ownership: OwnershipDto,
    #[serde(default)]
    pub valuation: Option<Valuation>,
}

impl From<NftSubmissionDto> for AssetSubmission {
    fn from(dto: NftSubmissionDto) -> Self {
        AssetSubmission {
            id: dto.id,
            metadata: dto.metadata,
            owner_id: dto.ownership.owner_id,
            valuation: dto.valuation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitInventoryRequest {
    pub wallet_id: WalletId,
    pub nfts: Vec<NftSubmissionDto>,
}

#[derive(Debug, Serialize)]
pub struct SubmitInventoryResponse {
    pub success: bool,
    pub new_loops_discovered: usize,
    pub changed_wallets: Vec<WalletId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WantedTargetDto {
    Asset(AssetId),
    Collection { collection_id: CollectionId },
}

impl From<WantedTargetDto> for WantTarget {
    fn from(dto: WantedTargetDto) -> Self {
        match dto {
            WantedTargetDto::Asset(asset_id) => WantTarget::Asset(asset_id),
            WantedTargetDto::Collection { collection_id } => WantTarget::Collection(collection_id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitWantsRequest {
    pub wallet_id: WalletId,
    pub wanted_nfts: Vec<WantedTargetDto>,
}

#[derive(Debug, Serialize)]
pub struct SubmitWantsResponse {
    pub success: bool,
    pub new_loops_discovered: usize,
}

fn default_discovery_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct DiscoveryRequest {
    pub wallet_id: WalletId,
    #[serde(default = "default_discovery_limit")]
    pub limit: usize,
    #[serde(default)]
    pub min_score: f64,
}

#[derive(Debug, Serialize)]
pub struct CycleView {
    pub id: CanonicalCycleId,
    pub steps: Vec<CycleStepView>,
    pub total_participants: usize,
    pub efficiency: f64,
    pub quality_score: f64,
}

#[derive(Debug, Serialize)]
pub struct CycleStepView {
    pub from: WalletId,
    pub to: WalletId,
    pub nfts: Vec<AssetId>,
}

impl CycleView {
    pub fn from_cycle_and_score(cycle: &Cycle, efficiency: f64, quality_score: f64) -> Self {
        Self {
            id: cycle.id.clone(),
            steps: cycle
                .steps
                .iter()
                .map(|s| CycleStepView {
                    from: s.from.clone(),
                    to: s.to.clone(),
                    nfts: s.nfts.clone(),
                })
                .collect(),
            total_participants: cycle.total_participants(),
            efficiency,
            quality_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub trades: Vec<CycleView>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TenantUsage {
    pub tenant_id: TenantId,
    pub wallet_count: usize,
    pub cached_cycle_count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub tenants: Vec<TenantUsage>,
}
