// SPDX-License-Identifier: Apache-2.0

//! Collection-level wants are resolved through an opaque pluggable predicate
//! invoked by the Cycle Engine when expanding edges. `GraphScanCollectionResolver`
//! is the default, in-memory implementation, scanning asset metadata in the
//! graph snapshot alone.

use std::collections::BTreeSet;
use tradeloop_common::{AssetId, CollectionId};
use tradeloop_graph::GraphSnapshot;

pub trait CollectionResolver: Send + Sync {
    fn resolve(&self, collection_id: &CollectionId, snapshot: &GraphSnapshot) -> BTreeSet<AssetId>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphScanCollectionResolver;

impl CollectionResolver for GraphScanCollectionResolver {
    fn resolve(&self, collection_id: &CollectionId, snapshot: &GraphSnapshot) -> BTreeSet<AssetId> {
        snapshot
            .assets
            .values()
            .filter(|asset| asset.metadata.collection_id.as_ref() == Some(collection_id))
            .map(|asset| asset.id.clone())
            .collect()
    }
}
