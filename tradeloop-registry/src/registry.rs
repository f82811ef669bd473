// SPDX-License-Identifier: Apache-2.0

//! Process-wide tenant lookup. Read-mostly: every submit/discovery request does
//! one lookup here before touching any tenant-owned state, the single
//! boundary check §5 requires to prevent cross-tenant access.

use crate::tenant::{Tenant, TenantSettings};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tradeloop_common::TenantId;
use tradeloop_identity::ApiKeySecret;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tenant {0} not found")]
    NotFound(TenantId),
}

#[derive(Default)]
pub struct TenantRegistry {
    tenants: DashMap<TenantId, Arc<RwLock<Tenant>>>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tenant and returns it alongside the plaintext API key, which is
    /// surfaced to the admin caller exactly once (§6 `POST /admin/tenants`).
    pub fn create(&self, settings: TenantSettings) -> (TenantId, ApiKeySecret) {
        let TenantSettings {
            name,
            contact_email,
            config,
        } = settings;

        let api_key = ApiKeySecret::generate();
        let webhook_secret = config
            .webhook_url
            .is_some()
            .then(|| ApiKeySecret::generate())
            .map(|secret| secret.into_secret_string());

        let tenant = Tenant::new(name, contact_email, config, api_key.hash(), webhook_secret);
        let id = tenant.id;

        self.tenants.insert(id, Arc::new(RwLock::new(tenant)));

        (id, api_key)
    }

    /// Inserts a tenant restored from a snapshot, preserving its id and API
    /// key hash exactly (§6 persisted state layout's `tenant.json`).
    pub fn insert_restored(&self, tenant: Tenant) {
        self.tenants.insert(tenant.id, Arc::new(RwLock::new(tenant)));
    }

    pub fn get(&self, id: TenantId) -> Result<Arc<RwLock<Tenant>>, RegistryError> {
        self.tenants
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::NotFound(id))
    }

    pub fn delete(&self, id: TenantId) -> Result<(), RegistryError> {
        self.tenants
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::NotFound(id))
    }

    /// Regenerates a tenant's API key, retiring the old hash atomically.
    pub fn rotate_api_key(&self, id: TenantId) -> Result<ApiKeySecret, RegistryError> {
        let handle = self.get(id)?;
        let new_key = ApiKeySecret::generate();
        handle.write().rotate_api_key(new_key.hash());
        Ok(new_key)
    }

    /// Finds the tenant whose active API key matches `candidate`, used to
    /// authenticate non-admin requests (§6: `Authorization: Bearer <apiKey>`).
    pub fn authenticate(&self, candidate: &str) -> Option<Arc<RwLock<Tenant>>> {
        self.tenants
            .iter()
            .find(|entry| entry.value().read().verify_api_key(candidate))
            .map(|entry| entry.value().clone())
    }

    /// Every tenant handle currently registered, used to walk all tenants for
    /// periodic snapshotting.
    pub fn snapshot_handles(&self) -> Vec<Arc<RwLock<Tenant>>> {
        self.tenants.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
