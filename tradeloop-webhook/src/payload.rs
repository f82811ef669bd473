// SPDX-License-Identifier: Apache-2.0

//! §6 webhook payload shape.

use serde::Serialize;
use tradeloop_common::{CanonicalCycleId, TenantId};
use tradeloop_engine::Cycle;
use tradeloop_scorer::Score;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub event: &'static str,
    pub tenant_id: TenantId,
    pub cycle_id: CanonicalCycleId,
    pub cycle: Cycle,
    pub score: Score,
    /// Unix epoch milliseconds. A plain integer avoids pulling in a
    /// date/time crate the rest of the workspace has no other use for.
    pub timestamp: u64,
    pub signature: String,
}

impl WebhookPayload {
    /// Builds the payload with `signature` left empty, serializes it, signs
    /// that serialization, then re-serializes with the real signature — the
    /// signature is carried both in the body and in the `X-Signature` header,
    /// so the body that gets hashed is the one without it.
    pub fn new(tenant_id: TenantId, cycle: Cycle, score: Score, timestamp: u64) -> (Self, Vec<u8>) {
        let unsigned = Self {
            event: "trade_discovered",
            tenant_id,
            cycle_id: cycle.id.clone(),
            cycle,
            score,
            timestamp,
            signature: String::new(),
        };
        let unsigned_body = serde_json::to_vec(&unsigned).expect("payload is always serializable");
        (unsigned, unsigned_body)
    }

    pub fn with_signature(mut self, signature: String) -> Self {
        self.signature = signature;
        self
    }
}
