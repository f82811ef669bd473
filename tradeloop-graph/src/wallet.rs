// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tradeloop_common::{AssetId, CollectionId};

/// A single entry of a wallet's want-set: either a specific asset or any asset
/// in a collection. Collection resolution is left to the Cycle Engine, which
/// expands it against a pluggable predicate when building edges (§9 Open
/// Questions).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WantTarget {
    Asset(AssetId),
    Collection(CollectionId),
}

/// A wallet's owned-set and want-set. The graph never shares these by
/// reference across wallets (§9: flat tables keyed by identifier).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletState {
    pub owns: BTreeSet<AssetId>,
    pub wants: BTreeSet<WantTarget>,
}
