// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;
use tradeloop_engine::Cycle;
use tradeloop_scorer::Score;

/// §4.2's cache state machine: `Candidate -> (scored) -> Admitted ->
/// (mutation invalidates a witness) -> Retired`. Entries reach this cache
/// already scored, so `upsert` always lands directly in `Admitted`;
/// `Candidate` documents the pre-cache state a cycle passes through in the
/// Event Dispatcher rather than one ever observed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Candidate,
    Admitted,
    Retired,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub cycle: Cycle,
    pub score: Score,
    pub state: CycleState,
    pub first_seen: Instant,
    pub last_verified: Instant,
    pub last_accessed: Instant,
}

impl CacheEntry {
    /// A coarse byte estimate for the memory budget — exact down to the
    /// allocator is not the point, a stable order-of-magnitude is.
    pub fn approx_size_bytes(&self) -> usize {
        let steps_bytes: usize = self
            .cycle
            .steps
            .iter()
            .map(|s| 64 + s.nfts.len() * 24)
            .sum();
        let wallets_bytes = self.cycle.wallets.len() * 24;
        128 + steps_bytes + wallets_bytes
    }
}
