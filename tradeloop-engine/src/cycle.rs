// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use tradeloop_common::{AssetId, CanonicalCycleId, WalletId};

/// One step of a cycle: wallet `from` gives `nfts` to `to` (§6 `Cycle.steps`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleStep {
    pub from: WalletId,
    pub to: WalletId,
    pub nfts: Vec<AssetId>,
}

/// A discovered, canonicalized cycle (§3 Cycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub id: CanonicalCycleId,
    /// Rotation-canonical wallet sequence, `wallets[0]` being the lexicographic
    /// minimum.
    pub wallets: Vec<WalletId>,
    pub steps: Vec<CycleStep>,
}

impl Cycle {
    pub fn total_participants(&self) -> usize {
        self.wallets.len()
    }
}

/// A group of cycles sharing a wallet sequence but differing in chosen assets
/// (§4.2 stage 4, config-gated bundle detection).
#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    pub representative: Cycle,
    pub alternatives: Vec<Cycle>,
}
