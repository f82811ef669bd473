// SPDX-License-Identifier: Apache-2.0

//! §4.6 Webhook Delivery: sign, POST with a short deadline, retry with
//! exponential backoff + jitter, dead-letter after `max_attempts`.

use crate::payload::WebhookPayload;
use crate::signing::sign;
use parking_lot::Mutex;
use rand::Rng;
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tradeloop_common::TenantId;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("non-success status {0}")]
    Status(u16),
}

/// The outbound transport, a port so tests can substitute a fake sender
/// without a live HTTP server (the same shape as the Cycle Engine's
/// `CollectionResolver`).
#[trait_variant::make(Send)]
pub trait WebhookSender {
    async fn post(&self, url: &str, body: Vec<u8>, signature: &str) -> Result<(), WebhookError>;
}

#[derive(Clone)]
pub struct ReqwestWebhookSender {
    client: reqwest::Client,
}

impl ReqwestWebhookSender {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .expect("static TLS/client config never fails to build");
        Self { client }
    }
}

impl WebhookSender for ReqwestWebhookSender {
    async fn post(&self, url: &str, body: Vec<u8>, signature: &str) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Signature", signature)
            .body(body)
            .send()
            .await
            .map_err(|e| WebhookError::Request(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(WebhookError::Status(response.status().as_u16()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub tenant_id: TenantId,
    pub payload: Vec<u8>,
    pub attempts: u32,
    pub last_error: String,
}

/// Append-only, per-tenant dead-letter log of deliveries that exhausted their
/// retries. Production deployments would ship this to durable storage;
/// in-process is enough to audit what was dropped.
#[derive(Default)]
pub struct DeadLetterLog {
    entries: Mutex<BTreeMap<TenantId, Vec<DeadLetterEntry>>>,
}

impl DeadLetterLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: DeadLetterEntry) {
        self.entries.lock().entry(entry.tenant_id).or_default().push(entry);
    }

    pub fn for_tenant(&self, tenant_id: &TenantId) -> Vec<DeadLetterEntry> {
        self.entries.lock().get(tenant_id).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_secs(3),
            max_attempts: 5,
            base_backoff: Duration::from_millis(200),
        }
    }
}

/// Delivers one payload, retrying with exponential backoff + full jitter.
/// Deliveries are at-least-once: a response lost after the remote actually
/// processed the POST will still retry, per §4.6.
pub async fn deliver<S: WebhookSender>(
    sender: &S,
    dead_letters: &DeadLetterLog,
    url: &str,
    webhook_secret: &SecretString,
    payload: WebhookPayload,
    unsigned_body: Vec<u8>,
    config: DeliveryConfig,
) -> Result<(), WebhookError> {
    let signature = sign(webhook_secret, &unsigned_body);
    let signed = payload.with_signature(signature.clone());
    let body = serde_json::to_vec(&signed).expect("payload is always serializable");

    let mut last_error = None;
    for attempt in 0..config.max_attempts {
        match sender.post(url, body.clone(), &signature).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(tenant_id = %signed.tenant_id, attempt, error = %e, "webhook delivery attempt failed");
                last_error = Some(e);
                if attempt + 1 < config.max_attempts {
                    tokio::time::sleep(backoff_with_jitter(config.base_backoff, attempt)).await;
                }
            }
        }
    }

    let error = last_error.expect("loop runs at least once since max_attempts > 0");
    dead_letters.record(DeadLetterEntry {
        tenant_id: signed.tenant_id,
        payload: body,
        attempts: config.max_attempts,
        last_error: error.to_string(),
    });
    Err(error)
}

fn backoff_with_jitter(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(1 << attempt.min(10));
    let jitter_ms = rand::thread_rng().gen_range(0..=exp.as_millis() as u64 / 2 + 1);
    exp + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tradeloop_engine::{Cycle, CycleStep};
    use tradeloop_scorer::Metrics;

    struct FlakySender {
        fail_times: u32,
        calls: AtomicU32,
    }

    impl WebhookSender for FlakySender {
        async fn post(&self, _url: &str, _body: Vec<u8>, _signature: &str) -> Result<(), WebhookError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(WebhookError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    fn dummy_cycle() -> Cycle {
        Cycle {
            id: tradeloop_common::CanonicalCycleId::new("A>B|X"),
            wallets: vec![
                tradeloop_common::WalletId::from("A"),
                tradeloop_common::WalletId::from("B"),
            ],
            steps: vec![CycleStep {
                from: tradeloop_common::WalletId::from("A"),
                to: tradeloop_common::WalletId::from("B"),
                nfts: vec![tradeloop_common::AssetId::from("X")],
            }],
        }
    }

    fn dummy_score() -> Score {
        Score {
            metrics: Metrics {
                value_variance: 1.0,
                value_ratio: 1.0,
                fairness_balance: 1.0,
                value_completeness: 1.0,
                length_penalty: 1.0,
                participant_diversity: 1.0,
                step_balance: 1.0,
                cycle_density: 1.0,
                floor_price_liquidity: 1.0,
                volume_proxy: 1.0,
                buyer_demand_proxy: 1.0,
                volatility_risk: 1.0,
                counterparty_familiarity: 1.0,
                execution_risk: 1.0,
                concentration_risk: 1.0,
                edge_success_rate: 1.0,
                wallet_reliability: 1.0,
                cohort_trust_floor: 1.0,
            },
            quality_score: 0.9,
            efficiency: 0.9,
        }
    }

    use tradeloop_scorer::Score;

    #[tokio::test]
    async fn retries_until_success_within_max_attempts() {
        let sender = FlakySender {
            fail_times: 2,
            calls: AtomicU32::new(0),
        };
        let dead_letters = DeadLetterLog::new();
        let (payload, body) = WebhookPayload::new(TenantId::new(), dummy_cycle(), dummy_score(), 0);
        let secret = SecretString::from("secret".to_owned());

        let result = deliver(
            &sender,
            &dead_letters,
            "http://example.invalid/webhook",
            &secret,
            payload,
            body,
            DeliveryConfig {
                max_attempts: 5,
                base_backoff: Duration::from_millis(1),
                ..Default::default()
            },
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn exhausting_attempts_dead_letters_the_payload() {
        let sender = FlakySender {
            fail_times: 100,
            calls: AtomicU32::new(0),
        };
        let dead_letters = DeadLetterLog::new();
        let tenant_id = TenantId::new();
        let (payload, body) = WebhookPayload::new(tenant_id, dummy_cycle(), dummy_score(), 0);
        let secret = SecretString::from("secret".to_owned());

        let result = deliver(
            &sender,
            &dead_letters,
            "http://example.invalid/webhook",
            &secret,
            payload,
            body,
            DeliveryConfig {
                max_attempts: 3,
                base_backoff: Duration::from_millis(1),
                ..Default::default()
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(dead_letters.for_tenant(&tenant_id).len(), 1);
    }
}
