// SPDX-License-Identifier: Apache-2.0

//! §4.2 Cycle Engine: canonical simple-cycle discovery over the Persistent
//! Graph, scoped to a dirty set for incremental re-discovery.

mod bloom;
mod cycle;
mod engine;
mod resolver;

pub use bloom::BloomFilter;
pub use cycle::{Bundle, Cycle, CycleStep};
pub use engine::{CycleEngine, DiscoveryOutcome, EngineConfig};
pub use resolver::{CollectionResolver, GraphScanCollectionResolver};
