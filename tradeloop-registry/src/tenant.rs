// SPDX-License-Identifier: Apache-2.0

use crate::config::TenantConfig;
use secrecy::SecretString;
use serde::Deserialize;
use tradeloop_common::TenantId;
use tradeloop_identity::StoredApiKeyHash;

/// Request body of `POST /admin/tenants`.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantSettings {
    pub name: String,
    pub contact_email: String,
    #[serde(default)]
    pub config: TenantConfig,
}

/// A registered tenant (§3 Tenant). Mutated only by admin operations.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub contact_email: String,
    pub config: TenantConfig,
    api_key_hash: StoredApiKeyHash,
    webhook_secret: Option<SecretString>,
}

impl Tenant {
    pub fn new(
        name: String,
        contact_email: String,
        config: TenantConfig,
        api_key_hash: StoredApiKeyHash,
        webhook_secret: Option<SecretString>,
    ) -> Self {
        Self {
            id: TenantId::new(),
            name,
            contact_email,
            config,
            api_key_hash,
            webhook_secret,
        }
    }

    pub fn verify_api_key(&self, candidate: &str) -> bool {
        self.api_key_hash.verify(candidate)
    }

    /// Retires the prior hash atomically by replacing it (§3 ApiKey: "on regenerate the
    /// prior hash is retired atomically").
    pub fn rotate_api_key(&mut self, new_hash: StoredApiKeyHash) {
        self.api_key_hash = new_hash;
    }

    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.webhook_secret.as_ref()
    }

    pub fn api_key_hash(&self) -> &StoredApiKeyHash {
        &self.api_key_hash
    }

    /// Rebuilds a tenant from its exact persisted fields, used by snapshot
    /// restore (§6 "Persisted state layout") rather than `new`, which always
    /// mints a fresh id.
    pub fn restore(
        id: TenantId,
        name: String,
        contact_email: String,
        config: TenantConfig,
        api_key_hash: StoredApiKeyHash,
        webhook_secret: Option<SecretString>,
    ) -> Self {
        Self {
            id,
            name,
            contact_email,
            config,
            api_key_hash,
            webhook_secret,
        }
    }
}
